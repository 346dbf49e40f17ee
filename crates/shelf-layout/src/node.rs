use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelf_core::DataPointer;

use crate::LayoutError;

/// Recognised per-node options. Anything else in a layout item is an error.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeOptions {
    /// Visibility switch of an optional section. Only nodes that carry it
    /// take part in show/hide.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<bool>,
    /// Keeps the node's controls disabled whatever `show` says.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
    /// Seeds the control when a new record has no value yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub widget: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expandable: bool,
}

/// One item as written in a layout document.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ItemSpec {
    Key(String),
    Node(NodeSpec),
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct NodeSpec {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemSpec>,
    #[serde(default)]
    pub options: NodeOptions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct LayoutNode {
    pub(crate) pointer: Option<DataPointer>,
    pub(crate) options: NodeOptions,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl LayoutNode {
    pub fn pointer(&self) -> Option<&DataPointer> {
        self.pointer.as_ref()
    }
    pub fn options(&self) -> &NodeOptions {
        &self.options
    }
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
    pub fn show(&self) -> Option<bool> {
        self.options.show
    }
    /// Field key this node binds to: first segment of its pointer.
    pub fn field_key(&self) -> Option<&str> {
        self.pointer.as_ref().and_then(DataPointer::first)
    }
}

/// Flattened layout tree in document order.
#[derive(Clone, Debug, Default)]
pub struct Layout {
    nodes: Vec<LayoutNode>,
    roots: Vec<NodeId>,
}

impl Layout {
    pub fn from_json(value: &Value) -> Result<Self, LayoutError> {
        let items: Vec<ItemSpec> = serde_json::from_value(value.clone())?;
        let mut layout = Layout::default();
        for item in items {
            let id = layout.push(item, None)?;
            layout.roots.push(id);
        }
        Ok(layout)
    }

    pub fn from_json_str(s: &str) -> Result<Self, LayoutError> {
        let value: Value = serde_json::from_str(s)?;
        Self::from_json(&value)
    }

    fn push(&mut self, item: ItemSpec, parent: Option<NodeId>) -> Result<NodeId, LayoutError> {
        let raw = match item {
            ItemSpec::Key(key) => NodeSpec {
                key: Some(key),
                items: Vec::new(),
                options: NodeOptions::default(),
            },
            ItemSpec::Node(node) => node,
        };
        let pointer = match raw.key {
            Some(k) => Some(DataPointer::parse(&k).map_err(|source| {
                LayoutError::InvalidPointer { key: k.clone(), source }
            })?),
            None => None,
        };
        let id = NodeId(self.nodes.len());
        self.nodes.push(LayoutNode {
            pointer,
            options: raw.options,
            parent,
            children: Vec::new(),
        });
        for child in raw.items {
            let cid = self.push(child, Some(id))?;
            self.nodes[id.0].children.push(cid);
        }
        Ok(id)
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn node(&self, id: NodeId) -> Option<&LayoutNode> {
        self.nodes.get(id.0)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut LayoutNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Nodes in document order. Ids are assigned in that order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &LayoutNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            out.push(cur);
            if let Some(n) = self.node(cur) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// Control pointers bound under `id` that have no bound node below them.
    pub fn leaf_pointers(&self, id: NodeId) -> Vec<DataPointer> {
        let mut out: Vec<DataPointer> = Vec::new();
        for nid in self.descendants(id) {
            let Some(ptr) = self.nodes[nid.0].pointer.as_ref() else {
                continue;
            };
            let has_bound_child = self
                .descendants(nid)
                .into_iter()
                .skip(1)
                .any(|d| self.nodes[d.0].pointer.is_some());
            if has_bound_child {
                continue;
            }
            let ctl = ptr.control_path();
            if !ctl.is_root() && !out.contains(&ctl) {
                out.push(ctl);
            }
        }
        out
    }
}
