use thiserror::Error;

/// Main error type for the file connector
#[derive(Error, Debug)]
pub enum IngestError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Corrupt or unreadable zip/tar container
    #[error("Archive error: {0}")]
    Archive(String),

    /// Member content is not valid UTF-8
    #[error("Decode error: {0}")]
    Decode(String),

    /// Malformed metadata sidecar line
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Convenient Result type using IngestError
pub type Result<T> = std::result::Result<T, IngestError>;
