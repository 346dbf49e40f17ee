//! Uniqueness checks against persisted records.
//!
//! A rule ([`AsyncRule`]) answers "is this value acceptable?" for a single
//! candidate. A [`FieldValidator`] runs a rule for a form field: it debounces
//! edits, marks the field pending, and publishes only the answer to the most
//! recently issued check.

use std::cell::RefCell;
use std::future::Future;

use shelf_core::{FieldError, RecordKind, Signal, ValidationConfig, ValidationState};
use web_time::Instant;

use crate::{Debounce, LatestOnly, RecordLookup, SearchQuery};

pub trait AsyncRule {
    fn check(&self, candidate: &str) -> impl Future<Output = Result<(), FieldError>>;
}

/// No other record of `kind` may hold `candidate` in `field`.
pub struct UniqueValue<L> {
    lookup: L,
    kind: RecordKind,
    field: String,
    own_pid: Option<String>,
    scope: Vec<(String, String)>,
}

impl<L: RecordLookup> UniqueValue<L> {
    /// Checks the kind's indexed unique field. `own_pid` is the record being
    /// edited, `None` when creating.
    pub fn new(lookup: L, kind: RecordKind, own_pid: Option<String>) -> Self {
        Self {
            lookup,
            kind,
            field: kind.unique_field().to_string(),
            own_pid,
            scope: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = field.into();
        self
    }

    /// Restricts the search, e.g. location codes within one library.
    pub fn with_scope(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope.push((field.into(), value.into()));
        self
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// A record created in this session becomes its own.
    pub fn set_own_pid(&mut self, pid: Option<String>) {
        self.own_pid = pid;
    }

    fn query(&self, candidate: &str) -> SearchQuery {
        self.scope
            .iter()
            .fold(SearchQuery::term(&self.field, candidate), |q, (f, v)| {
                q.and(f, v)
            })
    }
}

impl<L: RecordLookup> AsyncRule for UniqueValue<L> {
    async fn check(&self, candidate: &str) -> Result<(), FieldError> {
        if candidate.trim().is_empty() {
            return Ok(());
        }
        let query = self.query(candidate);
        match self.lookup.search(self.kind, &query).await {
            Ok(hits) => {
                let own = self.own_pid.as_deref();
                if hits.pids().any(|pid| Some(pid) != own) {
                    Err(FieldError::AlreadyTaken)
                } else {
                    Ok(())
                }
            }
            Err(err) => {
                log::warn!("{} {} lookup for `{}`: {err}", self.kind, self.field, query.q());
                Err(FieldError::Unverifiable)
            }
        }
    }
}

/// Barcode must be unique among its own kind, and must not be in use by the
/// counterpart kind (items vs patrons).
pub struct BarcodeRule<L> {
    own: UniqueValue<L>,
    other: Option<UniqueValue<L>>,
}

impl<L: RecordLookup + Clone> BarcodeRule<L> {
    pub fn new(lookup: L, kind: RecordKind, own_pid: Option<String>) -> Self {
        let other = kind
            .barcode_counterpart()
            .map(|k| UniqueValue::new(lookup.clone(), k, None).with_field("barcode"));
        Self {
            own: UniqueValue::new(lookup, kind, own_pid).with_field("barcode"),
            other,
        }
    }

    pub fn set_own_pid(&mut self, pid: Option<String>) {
        self.own.set_own_pid(pid);
    }
}

impl<L: RecordLookup> AsyncRule for BarcodeRule<L> {
    async fn check(&self, candidate: &str) -> Result<(), FieldError> {
        self.own.check(candidate).await?;
        let Some(other) = &self.other else {
            return Ok(());
        };
        match other.check(candidate).await {
            Err(FieldError::AlreadyTaken) => Err(FieldError::UsedByOtherKind { kind: other.kind }),
            r => r,
        }
    }
}

/// The uniqueness rule a record kind's key field gets.
pub enum KindRule<L> {
    Unique(UniqueValue<L>),
    Barcode(BarcodeRule<L>),
}

impl<L: RecordLookup + Clone> KindRule<L> {
    pub fn for_kind(lookup: L, kind: RecordKind, own_pid: Option<String>) -> Self {
        if kind.barcode_counterpart().is_some() {
            KindRule::Barcode(BarcodeRule::new(lookup, kind, own_pid))
        } else {
            KindRule::Unique(UniqueValue::new(lookup, kind, own_pid))
        }
    }

    pub fn set_own_pid(&mut self, pid: Option<String>) {
        match self {
            KindRule::Unique(r) => r.set_own_pid(pid),
            KindRule::Barcode(r) => r.set_own_pid(pid),
        }
    }
}

impl<L: RecordLookup> AsyncRule for KindRule<L> {
    async fn check(&self, candidate: &str) -> Result<(), FieldError> {
        match self {
            KindRule::Unique(r) => r.check(candidate).await,
            KindRule::Barcode(r) => r.check(candidate).await,
        }
    }
}

/// Runs a rule for one field and publishes the result on its state signal.
pub struct FieldValidator<R> {
    rule: R,
    gate: LatestOnly,
    state: Signal<ValidationState>,
    debounce: RefCell<Debounce<String>>,
}

impl<R: AsyncRule> FieldValidator<R> {
    pub fn new(rule: R, state: Signal<ValidationState>, config: &ValidationConfig) -> Self {
        Self {
            rule,
            gate: LatestOnly::new(),
            state,
            debounce: RefCell::new(Debounce::new(config.debounce())),
        }
    }

    pub fn state(&self) -> &Signal<ValidationState> {
        &self.state
    }

    pub fn rule(&self) -> &R {
        &self.rule
    }

    pub fn rule_mut(&mut self) -> &mut R {
        &mut self.rule
    }

    /// Records an edit. A newer edit makes any in-flight check stale.
    pub fn changed(&self, value: impl Into<String>, now: Instant) {
        self.gate.invalidate();
        self.debounce.borrow_mut().push(value.into(), now);
    }

    /// The value whose quiet period is over, if any.
    pub fn due(&self, now: Instant) -> Option<String> {
        self.debounce.borrow_mut().take_ready(now)
    }

    pub fn flush(&self) -> Option<String> {
        self.debounce.borrow_mut().flush()
    }

    /// Checks `candidate`. Returns `None` when a newer check was issued while
    /// this one was in flight; its result is then discarded.
    pub async fn validate(&self, candidate: &str) -> Option<ValidationState> {
        let ticket = self.gate.issue();
        if candidate.trim().is_empty() {
            self.state.set(ValidationState::Valid);
            return Some(ValidationState::Valid);
        }
        self.state.set(ValidationState::Pending);
        let result = self.rule.check(candidate).await;
        if !ticket.is_current() {
            log::debug!("dropping stale check #{} for `{candidate}`", ticket.serial());
            return None;
        }
        let state = ValidationState::from(result);
        self.state.set(state.clone());
        Some(state)
    }

    /// Validates the debounced value if its quiet period is over.
    pub async fn run_due(&self, now: Instant) -> Option<ValidationState> {
        let value = self.due(now)?;
        self.validate(&value).await
    }
}
