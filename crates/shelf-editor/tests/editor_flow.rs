use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use serde_json::{Value, json};
use shelf_core::*;
use shelf_editor::*;
use shelf_layout::EditMode;
use shelf_validators::{KindRule, SearchHits, SearchQuery, UniqueValue};
use web_time::Instant;

fn policy_layout() -> Value {
    json!([
        "name",
        "description",
        {"key": "allow_checkout", "options": {"default": true, "title": "Allow checkout"}},
        {"options": {"show": true, "title": "Renewals"}, "items": [
            "/number_renewals",
            "/renewal_duration"
        ]},
        {"options": {"show": false, "title": "Reminders", "expandable": true},
         "items": ["/reminders"]}
    ])
}

fn seeded() -> Rc<MemoryRecordService> {
    let svc = Rc::new(MemoryRecordService::new());
    svc.insert(
        RecordKind::CirculationPolicy,
        json!({"name": "Short loans", "number_renewals": 1, "renewal_duration": 7}),
    );
    svc.insert(
        RecordKind::CirculationPolicy,
        json!({"name": "Default", "allow_checkout": false, "reminders": [{"days_delay": 5}]}),
    );
    svc
}

fn history() -> History<Route> {
    History::new(Route::List {
        kind: RecordKind::CirculationPolicy,
    })
}

fn p(s: &str) -> DataPointer {
    DataPointer::parse(s).unwrap()
}

#[tokio::test]
async fn creating_a_policy_checks_name_then_redirects() {
    let svc = seeded();
    let mut session = EditorSession::open_json(
        svc.clone(),
        history(),
        RecordKind::CirculationPolicy,
        None,
        &policy_layout(),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(session.mode(), EditMode::Create);
    assert_eq!(session.form().value_at(&p("/allow_checkout")), Some(&json!(true)));
    assert_eq!(session.form().is_enabled(&p("/reminders")), Some(false));

    session
        .set_value(&p("/name"), json!("Short loans"), Instant::now())
        .unwrap();
    match session.submit().await {
        Err(EditorError::Invalid(errors)) => {
            assert_eq!(errors, vec![(p("/name"), FieldError::AlreadyTaken)])
        }
        other => panic!("expected invalid form, got {other:?}"),
    }
    assert_eq!(svc.count(RecordKind::CirculationPolicy), 2);

    session
        .set_value(&p("/name"), json!("Long loans"), Instant::now())
        .unwrap();
    session
        .set_value(&p("/number_renewals"), json!(3), Instant::now())
        .unwrap();
    let record = session.submit().await.unwrap();
    assert_eq!(
        record.metadata,
        json!({
            "pid": record.id,
            "name": "Long loans",
            "allow_checkout": true,
            "number_renewals": 3
        })
    );
    assert_eq!(session.pid(), Some(record.id.as_str()));
    assert_eq!(
        session.history().current(),
        Some(Route::Detail {
            kind: RecordKind::CirculationPolicy,
            pid: record.id.clone()
        })
    );
    assert!(session.scope().is_disposed());
}

#[tokio::test]
async fn editing_hides_empty_sections_and_keeps_own_name() {
    let svc = seeded();
    let mut session = EditorSession::open_json(
        svc.clone(),
        history(),
        RecordKind::CirculationPolicy,
        Some("2".into()),
        &policy_layout(),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    assert_eq!(session.opened_with().hidden.len(), 1);
    assert_eq!(session.opened_with().revealed.len(), 1);
    assert_eq!(session.form().is_enabled(&p("/number_renewals")), Some(false));
    assert_eq!(session.form().is_enabled(&p("/reminders")), Some(true));

    // Re-typing its own name is not a collision.
    session
        .set_value(&p("/name"), json!("Default"), Instant::now())
        .unwrap();
    let record = session.submit().await.unwrap();
    assert_eq!(
        record.metadata,
        json!({
            "pid": "2",
            "name": "Default",
            "allow_checkout": false,
            "reminders": [{"days_delay": 5}]
        })
    );
}

#[tokio::test]
async fn revealing_a_section_puts_its_fields_back_in_the_payload() {
    let svc = seeded();
    let mut session = EditorSession::open_json(
        svc.clone(),
        history(),
        RecordKind::CirculationPolicy,
        Some("2".into()),
        &policy_layout(),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    let renewals = session.engine().governing("number_renewals").unwrap();
    assert!(session.reveal(renewals).is_empty());
    session
        .set_value(&p("/renewal_duration"), json!(14), Instant::now())
        .unwrap();
    let record = session.submit().await.unwrap();
    assert_eq!(record.field("renewal_duration"), Some(&json!(14)));

    // Hiding drops it again.
    let mut again = EditorSession::open_json(
        svc,
        history(),
        RecordKind::CirculationPolicy,
        Some("2".into()),
        &policy_layout(),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    again.hide(renewals);
    let record = again.submit().await.unwrap();
    assert_eq!(record.field("renewal_duration"), None);
}

#[tokio::test]
async fn save_failure_shows_server_text_in_banner() {
    let svc = seeded();
    let mut session = EditorSession::open_json(
        svc.clone(),
        history(),
        RecordKind::CirculationPolicy,
        Some("1".into()),
        &policy_layout(),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    svc.set_failure(Some(ServiceError::Server {
        status: 400,
        message: "policy already assigned to this library".into(),
    }));
    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, EditorError::Save(ServiceError::Server { status: 400, .. })));
    assert_eq!(
        session.banner().get().as_deref(),
        Some("policy already assigned to this library")
    );
    assert!(matches!(
        session.history().current(),
        Some(Route::Editor { .. })
    ));

    svc.set_failure(None);
    session.submit().await.unwrap();
    assert_eq!(session.banner().get(), None);
}

#[tokio::test]
async fn unreachable_lookup_blocks_submit_as_unverifiable() {
    let svc = seeded();
    let mut session = EditorSession::open_json(
        svc.clone(),
        history(),
        RecordKind::CirculationPolicy,
        None,
        &policy_layout(),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    session
        .set_value(&p("/name"), json!("Anything"), Instant::now())
        .unwrap();
    svc.set_failure(Some(ServiceError::Transport("connection reset".into())));
    match session.submit().await {
        Err(EditorError::Invalid(errors)) => {
            assert_eq!(errors, vec![(p("/name"), FieldError::Unverifiable)])
        }
        other => panic!("expected invalid form, got {other:?}"),
    }
}

#[tokio::test]
async fn cancel_goes_back_and_releases_subscriptions() {
    let svc = seeded();
    let h = history();
    let session = EditorSession::open_json(
        svc,
        h.clone(),
        RecordKind::CirculationPolicy,
        None,
        &policy_layout(),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    let name_state = session.form().validation(&p("/name")).unwrap();
    assert_eq!(name_state.subscriber_count(), 1);
    assert_eq!(h.len(), 2);

    assert!(session.cancel());
    assert_eq!(h.len(), 1);
    assert!(session.scope().is_disposed());
    assert_eq!(name_state.subscriber_count(), 0);
}

#[tokio::test]
async fn loading_a_missing_record_fails() {
    let err = EditorSession::open_json(
        seeded(),
        history(),
        RecordKind::CirculationPolicy,
        Some("99".into()),
        &policy_layout(),
        ShelfConfig::default(),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(
        err,
        EditorError::Load {
            source: ServiceError::NotFound { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn unknown_layout_option_is_refused() {
    let err = EditorSession::open_json(
        seeded(),
        history(),
        RecordKind::CirculationPolicy,
        None,
        &json!([{"key": "name", "options": {"hidden": true}}]),
        ShelfConfig::default(),
    )
    .await
    .err()
    .unwrap();
    assert!(matches!(err, EditorError::Layout(_)));
}

#[tokio::test]
async fn item_barcode_used_by_a_patron_is_flagged() {
    let svc = Rc::new(MemoryRecordService::new());
    svc.insert(RecordKind::Patron, json!({"barcode": "2050124311"}));
    let mut session = EditorSession::open_json(
        svc,
        History::new(Route::List {
            kind: RecordKind::Item,
        }),
        RecordKind::Item,
        None,
        &json!(["barcode", "call_number"]),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    session
        .set_value(&p("/barcode"), json!("2050124311"), Instant::now())
        .unwrap();
    let err = session.submit().await.unwrap_err();
    match err {
        EditorError::Invalid(errors) => assert_eq!(
            errors,
            vec![(
                p("/barcode"),
                FieldError::UsedByOtherKind {
                    kind: RecordKind::Patron
                }
            )]
        ),
        other => panic!("unexpected {other:?}"),
    }
}

#[tokio::test]
async fn bad_opening_hours_block_library_save() {
    let svc = Rc::new(MemoryRecordService::new());
    let mut session = EditorSession::open_json(
        svc.clone(),
        History::new(Route::List {
            kind: RecordKind::Library,
        }),
        RecordKind::Library,
        None,
        &json!(["code", "name", {"key": "opening_hours", "items": [
            "/opening_hours/-/day",
            "/opening_hours/-/times"
        ]}]),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    let now = Instant::now();
    session.set_value(&p("/code"), json!("AOSTE"), now).unwrap();
    session
        .set_value(
            &p("/opening_hours"),
            json!([{"day": "monday", "is_open": true, "times": [
                {"start_time": "09:00", "end_time": "08:00"}
            ]}]),
            now,
        )
        .unwrap();
    match session.submit().await {
        Err(EditorError::Invalid(errors)) => assert_eq!(
            errors,
            vec![(p("/opening_hours"), FieldError::StartNotBeforeEnd)]
        ),
        other => panic!("unexpected {other:?}"),
    }

    session
        .set_value(
            &p("/opening_hours"),
            json!([{"day": "monday", "is_open": true, "times": [
                {"start_time": "08:00", "end_time": "12:00"},
                {"start_time": "13:00", "end_time": "18:00"}
            ]}]),
            now,
        )
        .unwrap();
    let record = session.submit().await.unwrap();
    assert_eq!(record.field("code"), Some(&json!("AOSTE")));
    assert_eq!(svc.count(RecordKind::Library), 1);
}

async fn open_policy(
    svc: &Rc<MemoryRecordService>,
    pid: &str,
    config: ShelfConfig,
) -> Result<EditorSession<Rc<MemoryRecordService>>, EditorError> {
    EditorSession::open_json(
        svc.clone(),
        history(),
        RecordKind::CirculationPolicy,
        Some(pid.to_string()),
        &policy_layout(),
        config,
    )
    .await
}

#[tokio::test]
async fn legacy_emptiness_from_config_hides_zero_valued_section() {
    let svc = Rc::new(MemoryRecordService::new());
    svc.insert(
        RecordKind::CirculationPolicy,
        json!({"name": "No renewals", "number_renewals": 0}),
    );
    let strict = open_policy(&svc, "1", ShelfConfig::default()).await.unwrap();
    assert!(strict.opened_with().hidden.is_empty());
    assert_eq!(strict.form().is_enabled(&p("/number_renewals")), Some(true));

    let legacy =
        ShelfConfig::from_json_str(r#"{"visibility": {"emptiness": "legacy_falsy"}}"#).unwrap();
    assert_eq!(legacy.validation.debounce_ms, 300);
    let session = open_policy(&svc, "1", legacy).await.unwrap();
    assert_eq!(session.opened_with().hidden.len(), 1);
    assert_eq!(session.form().is_enabled(&p("/number_renewals")), Some(false));
}

#[tokio::test]
async fn saving_keeps_fields_the_layout_does_not_show() {
    let svc = Rc::new(MemoryRecordService::new());
    svc.insert(
        RecordKind::CirculationPolicy,
        json!({"name": "Default", "organisation": {"pid": "1"}, "$schema": "x"}),
    );
    let mut session = EditorSession::open_json(
        svc.clone(),
        history(),
        RecordKind::CirculationPolicy,
        Some("1".into()),
        &json!(["name", "description"]),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    let record = session.submit().await.unwrap();
    assert_eq!(
        record.metadata,
        json!({
            "pid": "1",
            "name": "Default",
            "organisation": {"pid": "1"},
            "$schema": "x"
        })
    );
}

#[tokio::test]
async fn created_record_can_be_saved_again_under_its_own_name() {
    let svc = seeded();
    let mut session = EditorSession::open_json(
        svc.clone(),
        history(),
        RecordKind::CirculationPolicy,
        None,
        &policy_layout(),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    session
        .set_value(&p("/name"), json!("Long loans"), Instant::now())
        .unwrap();
    let created = session.submit().await.unwrap();

    session
        .set_value(&p("/name"), json!("Long loans"), Instant::now())
        .unwrap();
    let updated = session.submit().await.unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(svc.count(RecordKind::CirculationPolicy), 3);
}

#[tokio::test]
async fn location_codes_are_unique_per_library() {
    let svc = Rc::new(MemoryRecordService::new());
    svc.insert(
        RecordKind::Location,
        json!({"code": "MAIN", "library": {"pid": "1"}}),
    );
    svc.insert(
        RecordKind::Location,
        json!({"code": "ANNEX", "library": {"pid": "2"}}),
    );
    let mut session = EditorSession::open_json(
        svc.clone(),
        History::new(Route::List {
            kind: RecordKind::Location,
        }),
        RecordKind::Location,
        None,
        &json!(["code", "name"]),
        ShelfConfig::default(),
    )
    .await
    .unwrap();
    let code = p("/code");
    for _ in 0..3 {
        let rule = UniqueValue::new(ServiceLookup(svc.clone()), RecordKind::Location, None)
            .with_scope("library.pid", "2");
        session.set_rule(&code, KindRule::Unique(rule)).unwrap();
    }
    let state = session.form().validation(&code).unwrap();
    assert_eq!(state.subscriber_count(), 1);

    session.set_value(&code, json!("ANNEX"), Instant::now()).unwrap();
    session.flush_validations().await;
    assert_eq!(
        state.get(),
        ValidationState::Invalid(FieldError::AlreadyTaken)
    );

    session.set_value(&code, json!("MAIN"), Instant::now()).unwrap();
    session.flush_validations().await;
    assert_eq!(state.get(), ValidationState::Valid);
}

/// Counts the searches issued against the wrapped service.
#[derive(Clone)]
struct CountingService {
    inner: Rc<MemoryRecordService>,
    lists: Rc<Cell<usize>>,
}

impl RecordService for CountingService {
    async fn get(&self, kind: RecordKind, pid: &str) -> Result<Record, ServiceError> {
        self.inner.get(kind, pid).await
    }

    async fn list(
        &self,
        kind: RecordKind,
        query: Option<&SearchQuery>,
        page: usize,
        size: usize,
    ) -> Result<SearchHits, ServiceError> {
        self.lists.set(self.lists.get() + 1);
        self.inner.list(kind, query, page, size).await
    }

    async fn create(&self, kind: RecordKind, payload: Value) -> Result<Record, ServiceError> {
        self.inner.create(kind, payload).await
    }

    async fn update(&self, kind: RecordKind, payload: Value) -> Result<Record, ServiceError> {
        self.inner.update(kind, payload).await
    }
}

#[tokio::test]
async fn name_lookup_waits_for_the_quiet_period() {
    let svc = CountingService {
        inner: seeded(),
        lists: Rc::new(Cell::new(0)),
    };
    let mut session = EditorSession::open_json(
        svc.clone(),
        history(),
        RecordKind::CirculationPolicy,
        None,
        &policy_layout(),
        ShelfConfig {
            validation: ValidationConfig { debounce_ms: 300 },
            ..Default::default()
        },
    )
    .await
    .unwrap();
    let t0 = Instant::now();
    session.set_value(&p("/name"), json!("Default"), t0).unwrap();

    session
        .run_due_validations(t0 + Duration::from_millis(299))
        .await;
    assert_eq!(svc.lists.get(), 0);

    session
        .run_due_validations(t0 + Duration::from_millis(300))
        .await;
    assert_eq!(svc.lists.get(), 1);
    let state = session.form().validation(&p("/name")).unwrap();
    assert_eq!(
        state.get(),
        ValidationState::Invalid(FieldError::AlreadyTaken)
    );

    session
        .run_due_validations(t0 + Duration::from_millis(900))
        .await;
    assert_eq!(svc.lists.get(), 1);
}
