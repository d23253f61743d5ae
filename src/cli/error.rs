//! CLI error types and conversions

use crate::config::ConfigError;
use crate::exporter::ExportError;
use crate::fetcher::FetcherError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// No `key=value` arguments at all
    #[error("No arguments included in run command. Unable to proceed.")]
    NoArguments,

    /// A required `key=value` argument is absent
    #[error("Missing \"{0}\" argument. Unable to proceed.")]
    MissingArgument(&'static str),

    /// A date argument is not strict `YYYY-MM-DD`
    #[error("Invalid \"{0}\". Must be in format \"YYYY-MM-DD\"")]
    InvalidDate(&'static str),

    /// Positional argument that is not a known `key=value`
    #[error("Unrecognized argument \"{0}\". Unable to proceed.")]
    UnrecognizedArgument(String),

    /// Environment or flag configuration error
    #[error("configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// Client construction error
    #[error("fetcher error: {0}")]
    FetcherError(#[from] FetcherError),

    /// Export error
    #[error("export error: {0}")]
    ExportError(#[from] ExportError),
}

impl CliError {
    /// Whether this error is about how the command was invoked, detected
    /// before any network or file activity
    pub fn is_usage_error(&self) -> bool {
        matches!(
            self,
            Self::NoArguments
                | Self::MissingArgument(_)
                | Self::InvalidDate(_)
                | Self::UnrecognizedArgument(_)
                | Self::ConfigError(_)
        )
    }
}
