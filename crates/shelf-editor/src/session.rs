//! One record being edited.
//!
//! An [`EditorSession`] owns the draft's controls and the visibility engine
//! for a single record. It is opened on top of a [`History`] entry; leaving
//! that entry (cancel, or the post-save redirect) disposes the session scope
//! and everything subscribed under it.

use serde_json::Value;
use shelf_core::*;
use shelf_layout::{EditMode, Layout, LayoutError, NodeId, VisibilityEngine, VisibilityReport};
use shelf_validators::{FieldValidator, KindRule, OpeningHours};
use thiserror::Error;
use web_time::Instant;

use crate::{History, Record, RecordService, Route, ServiceError, ServiceLookup};

pub const OPENING_HOURS: &str = "opening_hours";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("could not load {kind} {pid}: {source}")]
    Load {
        kind: RecordKind,
        pid: String,
        source: ServiceError,
    },
    #[error("{} field(s) need attention", .0.len())]
    Invalid(Vec<(DataPointer, FieldError)>),
    #[error("save failed: {0}")]
    Save(ServiceError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// A uniqueness rule bound to one control, with the guard of its log watch.
struct KeyCheck<S> {
    pointer: DataPointer,
    validator: FieldValidator<KindRule<ServiceLookup<S>>>,
    guard: Dispose,
}

pub struct EditorSession<S: RecordService + Clone> {
    service: S,
    history: History<Route>,
    kind: RecordKind,
    pid: Option<String>,
    /// Record as loaded (or seeded); saves are laid over it.
    stored: Value,
    engine: VisibilityEngine,
    form: FormTree,
    config: ShelfConfig,
    checks: Vec<KeyCheck<S>>,
    banner: Signal<Option<String>>,
    scope: Scope,
    opened_with: VisibilityReport,
}

impl<S: RecordService + Clone> EditorSession<S> {
    /// Loads the record (or starts a new one), pushes the editor route and
    /// lays the form out for it.
    pub async fn open(
        service: S,
        history: History<Route>,
        kind: RecordKind,
        pid: Option<String>,
        layout: Layout,
        config: ShelfConfig,
    ) -> Result<Self, EditorError> {
        let mode = if pid.is_some() {
            EditMode::Edit
        } else {
            EditMode::Create
        };
        let mut draft = match &pid {
            Some(p) => {
                service
                    .get(kind, p)
                    .await
                    .map_err(|source| EditorError::Load {
                        kind,
                        pid: p.clone(),
                        source,
                    })?
                    .metadata
            }
            None => Value::Object(Default::default()),
        };
        if mode == EditMode::Create {
            let seeded = shelf_layout::seed_defaults(&layout, &mut draft);
            if !seeded.is_empty() {
                log::debug!("editor: seeded {} default(s)", seeded.len());
            }
        }

        let mut form = shelf_layout::build_form(&layout, &draft);
        let mut engine = VisibilityEngine::new(layout, mode, &config.visibility);
        let opened_with = engine.apply(&draft, &mut form);

        history.push(Route::Editor {
            kind,
            pid: pid.clone(),
        });
        let scope = history.current_scope().unwrap_or_default().child();

        let mut session = Self {
            service,
            history,
            kind,
            pid,
            stored: draft,
            engine,
            form,
            config,
            checks: Vec::new(),
            banner: signal(None),
            scope,
            opened_with,
        };
        session.attach_key_validator();
        session.check_opening_hours();
        log::info!(
            "editor: opened {} {}",
            kind,
            session.pid.as_deref().unwrap_or("(new)")
        );
        Ok(session)
    }

    pub async fn open_json(
        service: S,
        history: History<Route>,
        kind: RecordKind,
        pid: Option<String>,
        layout: &Value,
        config: ShelfConfig,
    ) -> Result<Self, EditorError> {
        let layout = Layout::from_json(layout)?;
        Self::open(service, history, kind, pid, layout, config).await
    }

    fn attach_key_validator(&mut self) {
        let pointer = DataPointer::key(self.kind.unique_field());
        let Some(state) = self.form.validation(&pointer) else {
            return;
        };
        let rule = KindRule::for_kind(
            ServiceLookup(self.service.clone()),
            self.kind,
            self.pid.clone(),
        );
        self.attach(pointer, rule, state);
    }

    fn attach(
        &mut self,
        pointer: DataPointer,
        rule: KindRule<ServiceLookup<S>>,
        state: Signal<ValidationState>,
    ) {
        self.detach(&pointer);
        let label = pointer.to_string();
        let guard = state.watch(move |s| {
            if let ValidationState::Invalid(e) = s {
                log::debug!("editor: {label} -> {}", e.tag());
            }
        });
        self.scope.add_dispose(guard.clone());
        let validator = FieldValidator::new(rule, state, &self.config.validation);
        self.checks.push(KeyCheck {
            pointer,
            validator,
            guard,
        });
    }

    fn detach(&mut self, pointer: &DataPointer) {
        self.checks.retain(|c| {
            if &c.pointer != pointer {
                return true;
            }
            c.guard.run();
            false
        });
    }

    /// Replaces the uniqueness rule of `pointer`, e.g. to scope location
    /// codes to their library.
    pub fn set_rule(
        &mut self,
        pointer: &DataPointer,
        rule: KindRule<ServiceLookup<S>>,
    ) -> Result<(), ControlError> {
        let state = self
            .form
            .validation(pointer)
            .ok_or_else(|| ControlError::NotFound(pointer.clone()))?;
        self.attach(pointer.clone(), rule, state);
        Ok(())
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }
    pub fn pid(&self) -> Option<&str> {
        self.pid.as_deref()
    }
    pub fn mode(&self) -> EditMode {
        self.engine.mode()
    }
    pub fn form(&self) -> &FormTree {
        &self.form
    }
    pub fn engine(&self) -> &VisibilityEngine {
        &self.engine
    }
    /// What the visibility engine changed when the session opened.
    pub fn opened_with(&self) -> &VisibilityReport {
        &self.opened_with
    }
    /// Save failure text, `None` while there is nothing to show.
    pub fn banner(&self) -> &Signal<Option<String>> {
        &self.banner
    }
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
    pub fn history(&self) -> &History<Route> {
        &self.history
    }

    /// A user edit. Fields with a uniqueness rule start their debounce.
    pub fn set_value(
        &mut self,
        pointer: &DataPointer,
        value: Value,
        now: Instant,
    ) -> Result<(), ControlError> {
        let text = candidate_text(&value);
        self.form.set_value(pointer, value)?;
        if let Some(c) = self.checks.iter().find(|c| &c.pointer == pointer) {
            c.validator.changed(text, now);
        }
        if pointer.first() == Some(OPENING_HOURS) {
            self.check_opening_hours();
        }
        Ok(())
    }

    /// Opens an optional section.
    pub fn reveal(&mut self, node: NodeId) -> Vec<DataPointer> {
        self.engine.set_shown(node, true, &mut self.form)
    }

    pub fn hide(&mut self, node: NodeId) -> Vec<DataPointer> {
        self.engine.set_shown(node, false, &mut self.form)
    }

    /// Runs checks whose debounce period is over.
    pub async fn run_due_validations(&self, now: Instant) {
        for c in &self.checks {
            c.validator.run_due(now).await;
        }
    }

    /// Runs every check still waiting on its debounce.
    pub async fn flush_validations(&self) {
        for c in &self.checks {
            if let Some(value) = c.validator.flush() {
                c.validator.validate(&value).await;
            }
        }
    }

    fn check_opening_hours(&self) {
        let pointer = DataPointer::key(OPENING_HOURS);
        let Some(state) = self.form.validation(&pointer) else {
            return;
        };
        let value = self.form.value_at(&pointer).cloned().unwrap_or(Value::Null);
        let result = if value.is_null() {
            Ok(())
        } else {
            match OpeningHours::from_value(&value) {
                Ok(hours) => hours.first_error(),
                Err(err) => {
                    log::debug!("editor: opening hours unreadable: {err}");
                    Err(FieldError::InvalidTime)
                }
            }
        };
        state.set(result.into());
    }

    /// Creates or updates the record, then redirects to its detail page.
    pub async fn submit(&mut self) -> Result<Record, EditorError> {
        self.flush_validations().await;
        let errors = self.form.errors();
        if !errors.is_empty() || self.form.has_pending() {
            return Err(EditorError::Invalid(errors));
        }

        let mut payload = self.stored.clone();
        self.form.write_onto(&mut payload);
        if let (Some(pid), Value::Object(map)) = (&self.pid, &mut payload) {
            map.insert("pid".into(), Value::String(pid.clone()));
        }
        let result = match self.pid {
            Some(_) => self.service.update(self.kind, payload).await,
            None => self.service.create(self.kind, payload).await,
        };
        match result {
            Ok(record) => {
                log::info!("editor: saved {} {}", self.kind, record.id);
                self.banner.set(None);
                self.form.mark_pristine();
                self.stored = record.metadata.clone();
                if self.pid.is_none() {
                    for c in &mut self.checks {
                        c.validator.rule_mut().set_own_pid(Some(record.id.clone()));
                    }
                }
                self.pid = Some(record.id.clone());
                self.history.replace(Route::Detail {
                    kind: self.kind,
                    pid: record.id.clone(),
                });
                Ok(record)
            }
            Err(err) => {
                log::warn!("editor: saving {} failed: {err}", self.kind);
                self.banner.set(Some(err.user_message()));
                Err(EditorError::Save(err))
            }
        }
    }

    /// Leaves the editor without saving.
    pub fn cancel(&self) -> bool {
        let left = self.history.back();
        if !left {
            self.scope.dispose();
        }
        left
    }

    pub fn close(&self) {
        self.scope.dispose();
    }
}

fn candidate_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

