//! # Layouts and visibility
//!
//! A layout is the declarative description of an editor screen: which field
//! each widget binds to, how widgets are grouped, and per-node options. Some
//! groups are optional sections carrying a `show` switch. The
//! [`VisibilityEngine`] decides which of those sections are open for a given
//! draft and enables or disables the controls beneath them:
//!
//! ```rust
//! use serde_json::json;
//! use shelf_core::VisibilityConfig;
//! use shelf_layout::*;
//!
//! let layout = Layout::from_json(&json!([
//!     "name",
//!     {"options": {"show": false, "title": "Fees"}, "items": ["/overdue_fees"]}
//! ]))
//! .unwrap();
//! let draft = json!({"name": "Standard", "overdue_fees": {"amount": 1}});
//! let mut form = build_form(&layout, &draft);
//! let mut engine = VisibilityEngine::new(layout, EditMode::Edit, &VisibilityConfig::default());
//! let report = engine.apply(&draft, &mut form);
//! assert_eq!(report.revealed.len(), 1);
//! ```
//!
//! Layout documents are JSON arrays. Items are either bare field keys or
//! objects with `key`, `items` and `options`; unknown option names are
//! rejected when parsing.

pub mod engine;
pub mod error;
pub mod form;
pub mod index;
pub mod node;

pub use engine::*;
pub use error::*;
pub use form::*;
pub use index::*;
pub use node::*;
