//! Logging configuration for myexec.
//!
//! Logs always go to stderr so stdout carries nothing but the JSON envelope.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
///
/// `RUST_LOG` wins when set; otherwise only warnings are shown unless
/// `verbose` is requested.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose))),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "myexec=debug,info"
    } else {
        "warn"
    }
}
