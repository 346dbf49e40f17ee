//! Reactive form controls.
//!
//! A [`FormTree`] holds one control per data pointer. Controls form a tree
//! that follows the pointer structure, so disabling `/renewal` also disables
//! `/renewal/duration`. Disabled controls are left out of [`FormTree::value`]
//! and out of validity checks.

use std::collections::HashMap;

use bitflags::bitflags;
use serde_json::{Map, Value};
use slotmap::{SlotMap, new_key_type};

use crate::error::ControlError;
use crate::{DataPointer, FieldError, Signal, ValidationState};

new_key_type! {
    pub struct ControlId;
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ControlFlags: u8 {
        const ENABLED = 1 << 0;
        const DIRTY = 1 << 1;
        /// Disabled by the layout; `set_enabled` cannot turn it back on.
        const LOCKED = 1 << 2;
    }
}

pub struct Control {
    pointer: DataPointer,
    value: Value,
    flags: ControlFlags,
    validation: Signal<ValidationState>,
    parent: Option<ControlId>,
    children: Vec<ControlId>,
}

impl Control {
    pub fn pointer(&self) -> &DataPointer {
        &self.pointer
    }
    pub fn value(&self) -> &Value {
        &self.value
    }
    pub fn flags(&self) -> ControlFlags {
        self.flags
    }
    pub fn is_enabled(&self) -> bool {
        self.flags.contains(ControlFlags::ENABLED)
    }
    pub fn is_dirty(&self) -> bool {
        self.flags.contains(ControlFlags::DIRTY)
    }
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
    pub fn parent(&self) -> Option<ControlId> {
        self.parent
    }
    pub fn children(&self) -> &[ControlId] {
        &self.children
    }
    /// Error-broadcasting channel for this field.
    pub fn validation(&self) -> &Signal<ValidationState> {
        &self.validation
    }
}

#[derive(Default)]
pub struct FormTree {
    controls: SlotMap<ControlId, Control>,
    by_pointer: HashMap<DataPointer, ControlId>,
    roots: Vec<ControlId>,
}

impl FormTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.controls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controls.is_empty()
    }

    /// Adds a control (and any missing ancestor groups). Inserting an existing
    /// pointer replaces its value.
    pub fn insert(&mut self, pointer: DataPointer, value: Value) -> ControlId {
        if let Some(&id) = self.by_pointer.get(&pointer) {
            self.controls[id].value = value;
            return id;
        }
        let parent = match pointer.parent() {
            Some(p) if !p.is_root() => Some(self.insert_group(p)),
            _ => None,
        };
        let flags = match parent {
            Some(p) => {
                self.controls[p].flags & (ControlFlags::ENABLED | ControlFlags::LOCKED)
            }
            None => ControlFlags::ENABLED,
        };
        let id = self.controls.insert(Control {
            pointer: pointer.clone(),
            value,
            flags,
            validation: Signal::new(ValidationState::Valid),
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.controls[p].children.push(id),
            None => self.roots.push(id),
        }
        self.by_pointer.insert(pointer, id);
        id
    }

    fn insert_group(&mut self, pointer: DataPointer) -> ControlId {
        match self.by_pointer.get(&pointer) {
            Some(&id) => id,
            None => self.insert(pointer, Value::Null),
        }
    }

    pub fn id(&self, pointer: &DataPointer) -> Option<ControlId> {
        self.by_pointer.get(pointer).copied()
    }

    pub fn get(&self, pointer: &DataPointer) -> Option<&Control> {
        self.id(pointer).and_then(|id| self.controls.get(id))
    }

    pub fn control(&self, id: ControlId) -> Option<&Control> {
        self.controls.get(id)
    }

    fn require(&self, pointer: &DataPointer) -> Result<ControlId, ControlError> {
        self.id(pointer)
            .ok_or_else(|| ControlError::NotFound(pointer.clone()))
    }

    pub fn contains(&self, pointer: &DataPointer) -> bool {
        self.by_pointer.contains_key(pointer)
    }

    pub fn value_at(&self, pointer: &DataPointer) -> Option<&Value> {
        self.get(pointer).map(|c| &c.value)
    }

    /// Writes a user edit. Object values written to a group are spread over
    /// its children.
    pub fn set_value(&mut self, pointer: &DataPointer, value: Value) -> Result<(), ControlError> {
        let id = self.require(pointer)?;
        self.write(id, value);
        Ok(())
    }

    fn write(&mut self, id: ControlId, value: Value) {
        let children = self.controls[id].children.clone();
        let value = match value {
            Value::Object(mut map) if !children.is_empty() => {
                for child in children {
                    let key = self.controls[child]
                        .pointer
                        .segments()
                        .last()
                        .cloned()
                        .unwrap_or_default();
                    let v = map.remove(&key).unwrap_or(Value::Null);
                    self.write(child, v);
                }
                return;
            }
            other => other,
        };
        let c = &mut self.controls[id];
        c.value = value;
        c.flags.insert(ControlFlags::DIRTY);
    }

    /// Enables or disables the control and everything under it. Locked
    /// controls stay disabled.
    pub fn set_enabled(
        &mut self,
        pointer: &DataPointer,
        enabled: bool,
    ) -> Result<(), ControlError> {
        let id = self.require(pointer)?;
        for cid in self.subtree(id) {
            let c = &mut self.controls[cid];
            if c.flags.contains(ControlFlags::LOCKED) {
                continue;
            }
            c.flags.set(ControlFlags::ENABLED, enabled);
        }
        Ok(())
    }

    pub fn lock(&mut self, pointer: &DataPointer) -> Result<(), ControlError> {
        let id = self.require(pointer)?;
        for cid in self.subtree(id) {
            let c = &mut self.controls[cid];
            c.flags.insert(ControlFlags::LOCKED);
            c.flags.remove(ControlFlags::ENABLED);
        }
        Ok(())
    }

    pub fn is_enabled(&self, pointer: &DataPointer) -> Option<bool> {
        self.get(pointer).map(Control::is_enabled)
    }

    pub fn validation(&self, pointer: &DataPointer) -> Option<Signal<ValidationState>> {
        self.get(pointer).map(|c| c.validation.clone())
    }

    fn subtree(&self, id: ControlId) -> Vec<ControlId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            out.push(cur);
            if let Some(c) = self.controls.get(cur) {
                stack.extend(c.children.iter().rev().copied());
            }
        }
        out
    }

    /// All controls in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Control> {
        self.roots
            .iter()
            .flat_map(|&r| self.subtree(r))
            .filter_map(|id| self.controls.get(id))
    }

    pub fn leaves(&self) -> impl Iterator<Item = &Control> {
        self.iter().filter(|c| c.is_leaf())
    }

    /// Submission payload: enabled leaves only, `null` values skipped.
    pub fn value(&self) -> Value {
        let mut out = Value::Object(Map::new());
        self.write_onto(&mut out);
        out
    }

    /// Lays the controls over a stored record. Enabled leaves overwrite their
    /// field; disabled or `null` leaves remove it. Fields without a control
    /// are kept.
    pub fn write_onto(&self, target: &mut Value) {
        for c in self.leaves() {
            if c.is_enabled() && !c.value.is_null() {
                c.pointer.assign(target, c.value.clone());
            } else {
                c.pointer.remove(target);
            }
        }
    }

    pub fn errors(&self) -> Vec<(DataPointer, FieldError)> {
        self.iter()
            .filter(|c| c.is_enabled())
            .filter_map(|c| {
                c.validation
                    .with(|s| s.error().cloned())
                    .map(|e| (c.pointer.clone(), e))
            })
            .collect()
    }

    pub fn has_pending(&self) -> bool {
        self.iter()
            .filter(|c| c.is_enabled())
            .any(|c| c.validation.with(ValidationState::is_pending))
    }

    pub fn is_valid(&self) -> bool {
        self.iter()
            .filter(|c| c.is_enabled())
            .all(|c| c.validation.with(ValidationState::is_valid))
    }

    pub fn is_dirty(&self) -> bool {
        self.controls.values().any(Control::is_dirty)
    }

    pub fn mark_pristine(&mut self) {
        for c in self.controls.values_mut() {
            c.flags.remove(ControlFlags::DIRTY);
        }
    }
}
