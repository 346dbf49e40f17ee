use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap};

use serde_json::{Value, json};
use shelf_core::RecordKind;
use shelf_validators::{Hit, HitMetadata, SearchHits, SearchQuery};

use crate::{Record, RecordService, ServiceError};

/// Record store kept in memory, for demos and tests.
#[derive(Default)]
pub struct MemoryRecordService {
    records: RefCell<HashMap<RecordKind, BTreeMap<u64, Value>>>,
    next_pid: Cell<u64>,
    failure: RefCell<Option<ServiceError>>,
}

impl MemoryRecordService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `metadata` under a fresh pid and returns the pid.
    pub fn insert(&self, kind: RecordKind, mut metadata: Value) -> String {
        let pid = self.next_pid.get() + 1;
        self.next_pid.set(pid);
        if let Value::Object(map) = &mut metadata {
            map.insert("pid".into(), json!(pid.to_string()));
        }
        self.records
            .borrow_mut()
            .entry(kind)
            .or_default()
            .insert(pid, metadata);
        pid.to_string()
    }

    /// Every call fails with `err` until cleared with `None`.
    pub fn set_failure(&self, err: Option<ServiceError>) {
        *self.failure.borrow_mut() = err;
    }

    pub fn count(&self, kind: RecordKind) -> usize {
        self.records.borrow().get(&kind).map_or(0, BTreeMap::len)
    }

    fn check_failure(&self) -> Result<(), ServiceError> {
        match self.failure.borrow().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn parse_pid(kind: RecordKind, pid: &str) -> Result<u64, ServiceError> {
        pid.parse().map_err(|_| ServiceError::NotFound {
            kind,
            pid: pid.to_string(),
        })
    }
}

/// Dotted path lookup (`library.pid`) compared on the value's text form.
fn matches(metadata: &Value, field: &str, expected: &str) -> bool {
    let found = field
        .split('.')
        .try_fold(metadata, |cur, seg| cur.get(seg));
    match found {
        Some(Value::String(s)) => s == expected,
        Some(Value::Number(n)) => n.to_string() == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        _ => false,
    }
}

fn record(pid: u64, metadata: &Value) -> Record {
    Record::new(pid.to_string(), metadata.clone())
}

impl RecordService for MemoryRecordService {
    async fn get(&self, kind: RecordKind, pid: &str) -> Result<Record, ServiceError> {
        self.check_failure()?;
        let n = Self::parse_pid(kind, pid)?;
        self.records
            .borrow()
            .get(&kind)
            .and_then(|m| m.get(&n))
            .map(|md| record(n, md))
            .ok_or_else(|| ServiceError::NotFound {
                kind,
                pid: pid.to_string(),
            })
    }

    async fn list(
        &self,
        kind: RecordKind,
        query: Option<&SearchQuery>,
        page: usize,
        size: usize,
    ) -> Result<SearchHits, ServiceError> {
        self.check_failure()?;
        let records = self.records.borrow();
        let matching: Vec<(u64, &Value)> = records
            .get(&kind)
            .into_iter()
            .flat_map(|m| m.iter())
            .filter(|(_, md)| {
                query.is_none_or(|q| q.terms().iter().all(|(f, v)| matches(md, f, v)))
            })
            .map(|(pid, md)| (*pid, md))
            .collect();
        let total = matching.len() as u64;
        let hits = matching
            .into_iter()
            .skip(page.saturating_sub(1) * size)
            .take(size)
            .map(|(pid, md)| Hit {
                metadata: HitMetadata {
                    pid: pid.to_string(),
                    fields: md.as_object().cloned().unwrap_or_default(),
                },
            })
            .collect();
        Ok(SearchHits::from_hits(hits, total))
    }

    async fn create(&self, kind: RecordKind, payload: Value) -> Result<Record, ServiceError> {
        self.check_failure()?;
        let pid = self.insert(kind, payload);
        self.get(kind, &pid).await
    }

    async fn update(&self, kind: RecordKind, mut payload: Value) -> Result<Record, ServiceError> {
        self.check_failure()?;
        let pid = payload
            .get("pid")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ServiceError::MissingPid)?;
        let n = Self::parse_pid(kind, &pid)?;
        let mut records = self.records.borrow_mut();
        let slot = records
            .get_mut(&kind)
            .and_then(|m| m.get_mut(&n))
            .ok_or_else(|| ServiceError::NotFound {
                kind,
                pid: pid.clone(),
            })?;
        if let Value::Object(map) = &mut payload {
            map.insert("pid".into(), json!(pid));
        }
        *slot = payload;
        Ok(record(n, slot))
    }
}
