//! Error type for the splitting engine and its host wrappers.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("buffer pool allocation failed")]
    Alloc,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
