use thiserror::Error;

use crate::RecordKind;

/// Per-field error, tagged so a renderer can tell which rule fired.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("already taken")]
    AlreadyTaken,
    #[error("could not be verified")]
    Unverifiable,
    #[error("already used by a {kind}")]
    UsedByOtherKind { kind: RecordKind },
    #[error("time must be written as HH:MM")]
    InvalidTime,
    #[error("start time must be before end time")]
    StartNotBeforeEnd,
    #[error("time ranges overlap")]
    Overlap,
}

impl FieldError {
    pub fn tag(&self) -> &'static str {
        match self {
            FieldError::AlreadyTaken => "already_taken",
            FieldError::Unverifiable => "unverifiable",
            FieldError::UsedByOtherKind { .. } => "used_by_other_kind",
            FieldError::InvalidTime => "invalid_time",
            FieldError::StartNotBeforeEnd => "start_not_before_end",
            FieldError::Overlap => "overlap",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum ValidationState {
    #[default]
    Valid,
    Pending,
    Invalid(FieldError),
}

impl ValidationState {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationState::Valid)
    }
    pub fn is_pending(&self) -> bool {
        matches!(self, ValidationState::Pending)
    }
    pub fn error(&self) -> Option<&FieldError> {
        match self {
            ValidationState::Invalid(e) => Some(e),
            _ => None,
        }
    }
}

impl From<Result<(), FieldError>> for ValidationState {
    fn from(r: Result<(), FieldError>) -> Self {
        match r {
            Ok(()) => ValidationState::Valid,
            Err(e) => ValidationState::Invalid(e),
        }
    }
}
