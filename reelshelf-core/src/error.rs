use thiserror::Error;

#[derive(Error, Debug)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Video not found: {0}")]
    NotFound(String),

    #[error("Invalid video id: {0}")]
    InvalidId(String),

    #[error("Unsupported media type: {0}")]
    UnsupportedMedia(String),

    #[error("Payload exceeds the {limit} byte limit")]
    TooLarge { limit: u64 },

    #[error("Slate generation failed: {0}")]
    Generation(#[source] std::io::Error),

    #[error("Metadata store is no longer running")]
    StoreClosed,
}

impl LibraryError {
    /// True for failures that mean "there is nothing at this id".
    pub fn is_not_found(&self) -> bool {
        matches!(self, LibraryError::NotFound(_) | LibraryError::InvalidId(_))
    }
}

pub type Result<T> = std::result::Result<T, LibraryError>;
