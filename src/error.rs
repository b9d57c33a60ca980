/// File-level parse failures. Individual bad rows never surface here.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("unsupported file: {0}")]
    UnsupportedFile(String),
}

impl From<csv::Error> for ParseError {
    fn from(err: csv::Error) -> Self {
        ParseError::Malformed(err.to_string())
    }
}

impl From<calamine::Error> for ParseError {
    fn from(err: calamine::Error) -> Self {
        ParseError::Malformed(err.to_string())
    }
}

/// Failures reading from a key-value store. An absent path is not an error.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("store returned status {status} for {path}")]
    Status { status: u16, path: String },

    #[error("store payload could not be decoded: {0}")]
    Decode(String),

    #[error("store database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store file error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Decode(err.to_string())
    }
}
