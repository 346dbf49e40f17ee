use serde_json::{Map, Value};
use shelf_core::{DataPointer, FormTree};

use crate::Layout;

/// Builds one control per bound leaf of the layout, seeded from `draft`.
/// Nodes marked `disabled` get their controls locked.
pub fn build_form(layout: &Layout, draft: &Value) -> FormTree {
    let mut form = FormTree::new();
    for (id, _) in layout.iter() {
        for ptr in layout.leaf_pointers(id) {
            if form.contains(&ptr) {
                continue;
            }
            let value = ptr.resolve(draft).cloned().unwrap_or(Value::Null);
            form.insert(ptr, value);
        }
    }
    for (id, node) in layout.iter() {
        if !node.options().disabled {
            continue;
        }
        for ptr in layout.leaf_pointers(id) {
            if let Err(err) = form.lock(&ptr) {
                log::warn!("layout: {err}");
            }
        }
    }
    form
}

/// Writes layout defaults into `draft` wherever it has no value yet.
pub fn seed_defaults(layout: &Layout, draft: &mut Value) -> Vec<DataPointer> {
    if !draft.is_object() {
        *draft = Value::Object(Map::new());
    }
    let mut seeded = Vec::new();
    for (_, node) in layout.iter() {
        let (Some(ptr), Some(default)) = (node.pointer(), node.options().default.as_ref()) else {
            continue;
        };
        let ctl = ptr.control_path();
        if ctl.is_root() || ctl.resolve(draft).is_some_and(|v| !v.is_null()) {
            continue;
        }
        ctl.assign(draft, default.clone());
        seeded.push(ctl);
    }
    seeded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn controls_follow_bound_leaves() {
        let layout = Layout::from_json(&json!([
            "name",
            {"key": "/pid", "options": {"disabled": true}},
            {"key": "/times", "items": ["/times/-/start_time", "/times/-/end_time"]},
            {"items": ["/fee/amount"]}
        ]))
        .unwrap();
        let draft = json!({"name": "x", "pid": "4", "times": [], "fee": {"amount": 1}});
        let form = build_form(&layout, &draft);
        assert_eq!(form.value_at(&DataPointer::key("times")), Some(&json!([])));
        assert_eq!(
            form.value_at(&DataPointer::parse("/fee/amount").unwrap()),
            Some(&json!(1))
        );
        assert_eq!(form.is_enabled(&DataPointer::key("pid")), Some(false));
        assert_eq!(
            form.value(),
            json!({"name": "x", "times": [], "fee": {"amount": 1}})
        );
    }

    #[test]
    fn defaults_only_fill_gaps() {
        let layout = Layout::from_json(&json!([
            {"key": "allow_checkout", "options": {"default": true}},
            {"key": "checkout_duration", "options": {"default": 14}},
            {"key": "name", "options": {"default": "ignored"}}
        ]))
        .unwrap();
        let mut draft = json!({"name": "Mine", "checkout_duration": null});
        let seeded = seed_defaults(&layout, &mut draft);
        assert_eq!(
            draft,
            json!({"name": "Mine", "allow_checkout": true, "checkout_duration": 14})
        );
        assert_eq!(seeded.len(), 2);
    }
}
