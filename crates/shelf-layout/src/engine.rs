use serde_json::Value;
use shelf_core::{DataPointer, EmptinessRule, FormTree, VisibilityConfig};

use crate::{Layout, NodeId, VisibilityIndex};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditMode {
    Create,
    Edit,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityReport {
    pub hidden: Vec<NodeId>,
    pub revealed: Vec<NodeId>,
    pub missing_controls: Vec<DataPointer>,
}

/// Keeps optional sections' `show` flags and their controls' enabled state in
/// step with the draft.
pub struct VisibilityEngine {
    layout: Layout,
    index: VisibilityIndex,
    mode: EditMode,
    emptiness: EmptinessRule,
}

impl VisibilityEngine {
    pub fn new(layout: Layout, mode: EditMode, config: &VisibilityConfig) -> Self {
        let index = VisibilityIndex::build(&layout);
        log::debug!(
            "visibility: {} governed field(s) over {} layout node(s)",
            index.len(),
            layout.len()
        );
        Self {
            layout,
            index,
            mode,
            emptiness: config.emptiness,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn index(&self) -> &VisibilityIndex {
        &self.index
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn governing(&self, key: &str) -> Option<NodeId> {
        self.index.get(key)
    }

    /// False when the node or any ancestor is hidden.
    pub fn is_shown(&self, id: NodeId) -> bool {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let Some(node) = self.layout.node(c) else {
                return false;
            };
            if node.show() == Some(false) {
                return false;
            }
            cur = node.parent();
        }
        true
    }

    /// Resolves every governed section against `draft`, then enables or
    /// disables the controls underneath.
    pub fn apply(&mut self, draft: &Value, form: &mut FormTree) -> VisibilityReport {
        let mut report = VisibilityReport::default();

        if self.mode == EditMode::Edit {
            let empty: Vec<(String, NodeId)> = self
                .index
                .iter()
                .filter(|(key, node)| {
                    self.layout.node(*node).and_then(|n| n.show()) == Some(true)
                        && !self.emptiness.is_present(draft.get(*key))
                })
                .map(|(k, n)| (k.to_string(), n))
                .collect();
            for (key, node) in empty {
                if self.emptiness.differs_from_strict(draft.get(&key)) {
                    log::warn!(
                        "visibility: hiding `{key}` although it holds {} \
                         (legacy emptiness rule)",
                        draft.get(&key).unwrap_or(&Value::Null)
                    );
                }
                if self.set_flag(node, false) {
                    log::debug!("visibility: hide node {} (no value for `{key}`)", node.index());
                    report.hidden.push(node);
                }
            }
        }

        if let Some(fields) = draft.as_object() {
            for (key, value) in fields {
                if !self.emptiness.is_present(Some(value)) {
                    continue;
                }
                let Some(node) = self.index.get(key) else {
                    continue;
                };
                if self.layout.node(node).and_then(|n| n.show()) == Some(false)
                    && self.set_flag(node, true)
                {
                    log::debug!("visibility: reveal node {} (`{key}` has a value)", node.index());
                    // Hidden and revealed in the same pass is no change.
                    match report.hidden.iter().position(|h| *h == node) {
                        Some(pos) => {
                            report.hidden.remove(pos);
                        }
                        None => report.revealed.push(node),
                    }
                }
            }
        }

        report.missing_controls = self.sync(form);
        report
    }

    /// User toggled a section. Nodes without a `show` option are left alone.
    /// Returns the pointers that had no control.
    pub fn set_shown(&mut self, id: NodeId, shown: bool, form: &mut FormTree) -> Vec<DataPointer> {
        match self.layout.node(id).map(|n| n.show()) {
            Some(Some(_)) => {
                self.set_flag(id, shown);
                self.sync(form)
            }
            Some(None) => {
                log::debug!("visibility: node {} has no show option", id.index());
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    fn set_flag(&mut self, id: NodeId, shown: bool) -> bool {
        match self.layout.node_mut(id) {
            Some(node) if node.options.show != Some(shown) => {
                node.options.show = Some(shown);
                true
            }
            _ => false,
        }
    }

    /// Pushes the current flags onto the form. Fields outside any governed
    /// section are not touched.
    pub fn sync(&self, form: &mut FormTree) -> Vec<DataPointer> {
        let mut missing = Vec::new();
        for &root in self.layout.roots() {
            self.sync_node(root, None, form, &mut missing);
        }
        missing
    }

    // Returns whether the subtree binds any field.
    fn sync_node(
        &self,
        id: NodeId,
        visible: Option<bool>,
        form: &mut FormTree,
        missing: &mut Vec<DataPointer>,
    ) -> bool {
        let Some(node) = self.layout.node(id) else {
            return false;
        };
        let visible = match node.show() {
            Some(s) => Some(visible.unwrap_or(true) && s),
            None => visible,
        };
        let mut bound_below = false;
        for &child in node.children() {
            bound_below |= self.sync_node(child, visible, form, missing);
        }
        if let (Some(ptr), false, Some(enabled)) = (node.pointer(), bound_below, visible) {
            let ctl = ptr.control_path();
            if let Err(err) = form.set_enabled(&ctl, enabled) {
                log::warn!("visibility: {err}");
                if !missing.contains(&ctl) {
                    missing.push(ctl);
                }
            }
        }
        bound_below || node.pointer().is_some()
    }
}
