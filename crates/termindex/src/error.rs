//! Error types

use thiserror::Error;

/// Problems with a configuration file or settings object
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("index hash table size must be positive")]
    EmptyHashTable,

    #[error("variable weight must be positive")]
    ZeroVariableWeight,

    #[error("unknown symbol in configuration: {0}")]
    UnknownSymbol(String),
}

/// Signals raised inside index maintenance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// The (term, cluster) key has no entry in the index
    #[error("no entry for the given term and cluster")]
    PairNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;
