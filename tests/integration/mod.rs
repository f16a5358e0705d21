//! Integration tests for myexec.

pub mod executor_test;
