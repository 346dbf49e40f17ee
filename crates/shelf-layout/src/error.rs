use shelf_core::PointerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("invalid layout: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid data pointer `{key}`: {source}")]
    InvalidPointer { key: String, source: PointerError },
}
