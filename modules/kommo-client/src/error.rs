use thiserror::Error;

pub type Result<T> = std::result::Result<T, KommoError>;

#[derive(Debug, Error)]
pub enum KommoError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Invalid Kommo domain: {0:?}")]
    InvalidDomain(String),
}

impl From<reqwest::Error> for KommoError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return KommoError::Parse(err.to_string());
        }
        KommoError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for KommoError {
    fn from(err: serde_json::Error) -> Self {
        KommoError::Parse(err.to_string())
    }
}
