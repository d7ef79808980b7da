use thiserror::Error;

/// Errors raised while loading configuration. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable was set but could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    /// The watchlist file could not be read.
    #[error("failed to read watchlist at {path}")]
    WatchlistIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The watchlist file is not valid YAML.
    #[error("failed to parse watchlist: {0}")]
    WatchlistParse(#[from] serde_yaml::Error),

    /// The watchlist parsed but failed validation.
    #[error("invalid watchlist: {0}")]
    WatchlistInvalid(String),
}
