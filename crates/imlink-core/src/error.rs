//! Error types for imlink-core

use thiserror::Error;

use crate::color::ColorError;
use crate::config::ConfigError;
use crate::store::StoreError;
use crate::transfer::TransferError;

/// Result type alias for imlink operations
pub type Result<T> = std::result::Result<T, ImlinkError>;

/// Main error type for imlink operations
#[derive(Error, Debug)]
pub enum ImlinkError {
    /// Persistence errors (duplicate url, missing record, storage)
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Import/export errors
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Malformed color input
    #[error("Color error: {0}")]
    Color(#[from] ColorError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Malformed input files other than JSON imports
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImlinkError {
    /// Whether this is the duplicate-url condition, which front ends show
    /// as a warning instead of a generic failure.
    pub fn is_duplicate_url(&self) -> bool {
        match self {
            ImlinkError::Store(e) => e.is_duplicate_url(),
            ImlinkError::Transfer(TransferError::Store(e)) => e.is_duplicate_url(),
            _ => false,
        }
    }
}
