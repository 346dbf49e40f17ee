use std::rc::Rc;

use serde_json::json;
use shelf_core::*;
use shelf_editor::*;
use shelf_layout::Layout;
use web_time::Instant;

const LAYOUT: &str = r#"[
    "name",
    "description",
    {"key": "allow_checkout", "options": {"default": true, "title": "Allow checkout"}},
    {"options": {"show": true, "title": "Renewals"}, "items": [
        "/number_renewals",
        "/renewal_duration"
    ]},
    {"options": {"show": false, "title": "Reminders", "expandable": true},
     "items": ["/reminders"]}
]"#;

fn seed(svc: &MemoryRecordService) {
    svc.insert(
        RecordKind::CirculationPolicy,
        json!({
            "name": "Default",
            "allow_checkout": true,
            "number_renewals": 2,
            "renewal_duration": 14
        }),
    );
    svc.insert(
        RecordKind::CirculationPolicy,
        json!({"name": "Reference only", "allow_checkout": false}),
    );
}

fn config() -> anyhow::Result<ShelfConfig> {
    match std::env::var("SHELF_CONFIG") {
        Ok(path) => Ok(ShelfConfig::from_json_str(&std::fs::read_to_string(path)?)?),
        Err(_) => Ok(ShelfConfig::default()),
    }
}

async fn run() -> anyhow::Result<()> {
    let svc = Rc::new(MemoryRecordService::new());
    seed(&svc);
    let history = History::new(Route::List {
        kind: RecordKind::CirculationPolicy,
    });
    let config = config()?;

    // Editing "Reference only": renewals start hidden, nothing stored there.
    let editing = EditorSession::open(
        svc.clone(),
        history.clone(),
        RecordKind::CirculationPolicy,
        Some("2".into()),
        Layout::from_json_str(LAYOUT)?,
        config.clone(),
    )
    .await?;
    println!(
        "opened policy 2: {} section(s) hidden, {} revealed",
        editing.opened_with().hidden.len(),
        editing.opened_with().revealed.len()
    );
    editing.cancel();

    let mut session = EditorSession::open(
        svc.clone(),
        history.clone(),
        RecordKind::CirculationPolicy,
        None,
        Layout::from_json_str(LAYOUT)?,
        config,
    )
    .await?;
    let name = DataPointer::key("name");

    session.set_value(&name, json!("Default"), Instant::now())?;
    match session.submit().await {
        Err(EditorError::Invalid(errors)) => {
            for (ptr, err) in errors {
                println!("{ptr}: {err}");
            }
        }
        other => log::warn!("expected a name clash, got {other:?}"),
    }

    session.set_value(&name, json!("Short loans"), Instant::now())?;
    session.set_value(&DataPointer::key("number_renewals"), json!(1), Instant::now())?;
    let record = session.submit().await?;
    println!("saved policy {}: {}", record.id, record.metadata);
    println!("history: {}", history.to_json());
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    pollster::block_on(run())
}
