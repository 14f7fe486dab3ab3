//! CLI error types.

use crosslink_config::ConfigError;
use crosslink_links::SiteIndexError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Index(#[from] SiteIndexError),

    #[error("{path}: {source}")]
    Page {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Validation(String),
}
