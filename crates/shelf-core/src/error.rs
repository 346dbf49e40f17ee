use thiserror::Error;

use crate::DataPointer;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointerError {
    #[error("empty segment in data pointer `{0}`")]
    EmptySegment(String),
    #[error("bad `~` escape in data pointer `{0}`")]
    BadEscape(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("control not found: {0}")]
    NotFound(DataPointer),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
