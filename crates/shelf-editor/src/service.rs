use std::future::Future;
use std::rc::Rc;

use serde_json::Value;
use shelf_core::RecordKind;
use shelf_validators::{LookupError, RecordLookup, SearchHits, SearchQuery};
use thiserror::Error;

use crate::Record;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{kind} {pid} not found")]
    NotFound { kind: RecordKind, pid: String },
    #[error("server answered {status}: {message}")]
    Server { status: u16, message: String },
    #[error("request failed: {0}")]
    Transport(String),
    #[error("payload has no pid")]
    MissingPid,
}

impl ServiceError {
    /// Text for the editor's error banner. Server messages are shown as sent.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Server { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

/// The REST record API the editors talk to.
pub trait RecordService {
    fn get(
        &self,
        kind: RecordKind,
        pid: &str,
    ) -> impl Future<Output = Result<Record, ServiceError>>;

    /// `page` starts at 1.
    fn list(
        &self,
        kind: RecordKind,
        query: Option<&SearchQuery>,
        page: usize,
        size: usize,
    ) -> impl Future<Output = Result<SearchHits, ServiceError>>;

    fn create(
        &self,
        kind: RecordKind,
        payload: Value,
    ) -> impl Future<Output = Result<Record, ServiceError>>;

    /// `payload` carries the pid of the record it replaces.
    fn update(
        &self,
        kind: RecordKind,
        payload: Value,
    ) -> impl Future<Output = Result<Record, ServiceError>>;
}

impl<S: RecordService> RecordService for Rc<S> {
    fn get(
        &self,
        kind: RecordKind,
        pid: &str,
    ) -> impl Future<Output = Result<Record, ServiceError>> {
        (**self).get(kind, pid)
    }
    fn list(
        &self,
        kind: RecordKind,
        query: Option<&SearchQuery>,
        page: usize,
        size: usize,
    ) -> impl Future<Output = Result<SearchHits, ServiceError>> {
        (**self).list(kind, query, page, size)
    }
    fn create(
        &self,
        kind: RecordKind,
        payload: Value,
    ) -> impl Future<Output = Result<Record, ServiceError>> {
        (**self).create(kind, payload)
    }
    fn update(
        &self,
        kind: RecordKind,
        payload: Value,
    ) -> impl Future<Output = Result<Record, ServiceError>> {
        (**self).update(kind, payload)
    }
}

/// Existence lookups served by the record list endpoint.
#[derive(Clone)]
pub struct ServiceLookup<S>(pub S);

impl<S: RecordService> RecordLookup for ServiceLookup<S> {
    async fn search(
        &self,
        kind: RecordKind,
        query: &SearchQuery,
    ) -> Result<SearchHits, LookupError> {
        self.0
            .list(kind, Some(query), 1, query.size())
            .await
            .map_err(|e| match e {
                ServiceError::Transport(m) => LookupError::Transport(m),
                ServiceError::Server { status, message } => {
                    LookupError::Status { status, message }
                }
                other => LookupError::Transport(other.to_string()),
            })
    }
}
