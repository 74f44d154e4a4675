use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("out of range: {0}")]
    OutOfRange(String),

    #[error("malformed cascade model: {0}")]
    MalformedModel(String),
}

pub type Result<T> = std::result::Result<T, Error>;
