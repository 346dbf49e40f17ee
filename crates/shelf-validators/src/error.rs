use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("lookup failed: {0}")]
    Transport(String),
    #[error("lookup answered {status}: {message}")]
    Status { status: u16, message: String },
    #[error("malformed lookup response: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for LookupError {
    fn from(e: serde_json::Error) -> Self {
        LookupError::Decode(e.to_string())
    }
}
