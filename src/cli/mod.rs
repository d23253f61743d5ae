//! CLI command implementation

pub mod args;
pub mod error;

pub use args::{parse_run_args, Cli, RunArgs};
pub use error::CliError;
