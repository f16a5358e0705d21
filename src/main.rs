//! myexec - run one MySQL statement and print the result envelope.

mod cli;
mod logging;

use cli::Cli;
use myexec::config::Config;
use myexec::error::{ExecutorError, Result};
use myexec::query::Operation;
use myexec::QueryExecutor;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse_args();
    logging::init_stderr_logging(cli.verbose);

    match run(&cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!("{}: {}", e.category(), e.message());
            std::process::exit(2);
        }
    }
}

/// Runs the requested operation. Returns whether the envelope reports success.
async fn run(cli: &Cli) -> Result<bool> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection_string = resolve_connection_string(cli, &config)?;
    let executor =
        QueryExecutor::with_parameters(connection_string, cli.query(), cli.parameters());

    let result = match cli.operation() {
        Operation::Fetch => executor.fetch().await,
        Operation::Insert => executor.insert().await,
        Operation::Update => executor.update().await,
    };

    let json = if cli.pretty {
        serde_json::to_string_pretty(&result)
    } else {
        serde_json::to_string(&result)
    }
    .map_err(|e| ExecutorError::internal(format!("Failed to serialize result: {e}")))?;

    println!("{json}");
    Ok(result.is_success())
}

/// Resolves the connection string with precedence:
/// 1. --url
/// 2. Named connection from config
/// 3. Default connection from config
/// 4. DATABASE_URL
///
/// When nothing resolves the executor gets an empty string and reports an
/// invalid request.
fn resolve_connection_string(cli: &Cli, config: &Config) -> Result<String> {
    if let Some(url) = &cli.url {
        return Ok(url.clone());
    }

    let profile = match cli.connection_name() {
        Some(name) => Some(config.get_connection(Some(name)).ok_or_else(|| {
            ExecutorError::config(format!("Connection '{name}' not found in config file"))
        })?),
        None => config.get_connection(None),
    };

    if let Some(profile) = profile {
        let mut profile = profile.clone();
        profile.apply_env_defaults();
        info!("Connection: {}", profile.display_string());
        return profile.to_connection_string();
    }

    match std::env::var("DATABASE_URL") {
        Ok(url) => Ok(url),
        Err(_) => {
            warn!("No database connection configured");
            Ok(String::new())
        }
    }
}
