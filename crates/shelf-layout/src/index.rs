use std::collections::HashMap;

use crate::{Layout, NodeId};

/// Field key -> node that decides whether the field is shown.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibilityIndex {
    by_key: HashMap<String, NodeId>,
    order: Vec<String>,
}

impl VisibilityIndex {
    /// Single top-down pass. The governing node is the last node carrying a
    /// `show` option seen in the current top-level branch; the first governing
    /// node seen for a key wins.
    pub fn build(layout: &Layout) -> Self {
        let mut index = Self::default();
        for &root in layout.roots() {
            let mut governing: Option<NodeId> = None;
            for id in layout.descendants(root) {
                let Some(node) = layout.node(id) else {
                    continue;
                };
                if node.show().is_some() {
                    governing = Some(id);
                }
                if let (Some(key), Some(g)) = (node.field_key(), governing) {
                    index.insert_if_absent(key, g);
                }
            }
        }
        index
    }

    fn insert_if_absent(&mut self, key: &str, node: NodeId) {
        if self.by_key.contains_key(key) {
            return;
        }
        self.by_key.insert(key.to_string(), node);
        self.order.push(key.to_string());
    }

    pub fn get(&self, key: &str) -> Option<NodeId> {
        self.by_key.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Entries in the order they were discovered.
    pub fn iter(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.order
            .iter()
            .map(|k| (k.as_str(), self.by_key[k.as_str()]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys governed by `node`.
    pub fn keys_for(&self, node: NodeId) -> Vec<&str> {
        self.iter()
            .filter(|(_, n)| *n == node)
            .map(|(k, _)| k)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keys_map_to_nearest_preceding_show_node() {
        let layout = Layout::from_json(&json!([
            "name",
            {"options": {"show": false}, "items": ["/renewal/duration", "/renewal/count"]},
            {"key": "reminders", "options": {"show": true}},
            {"items": ["description"]}
        ]))
        .unwrap();
        let index = VisibilityIndex::build(&layout);
        assert!(!index.contains("name"));
        assert!(!index.contains("description"));
        assert_eq!(index.get("renewal"), Some(NodeId(1)));
        assert_eq!(index.get("reminders"), Some(NodeId(4)));
        assert_eq!(index.len(), 2);
        assert_eq!(index.keys_for(NodeId(1)), vec!["renewal"]);
    }

    #[test]
    fn later_show_node_in_same_branch_takes_over() {
        let layout = Layout::from_json(&json!([
            {"items": [
                {"key": "a", "options": {"show": true}},
                "b",
                {"key": "c", "options": {"show": false}},
                "d",
                "b"
            ]}
        ]))
        .unwrap();
        let index = VisibilityIndex::build(&layout);
        assert_eq!(index.get("a"), Some(NodeId(1)));
        assert_eq!(index.get("b"), Some(NodeId(1)));
        assert_eq!(index.get("c"), Some(NodeId(3)));
        assert_eq!(index.get("d"), Some(NodeId(3)));
    }

    #[test]
    fn governing_node_resets_per_top_level_branch() {
        let layout = Layout::from_json(&json!([
            {"options": {"show": true}, "items": ["a"]},
            {"items": ["b"]}
        ]))
        .unwrap();
        let index = VisibilityIndex::build(&layout);
        assert!(index.contains("a"));
        assert!(!index.contains("b"));
    }
}
