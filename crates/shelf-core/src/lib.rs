//! # Controls, Signals, and Scopes
//!
//! Shelf's record editors sit on a small reactive core:
//!
//! - `Signal<T>`: observable value; each form control publishes its
//!   `ValidationState` through one.
//! - `FormTree`: one control per data pointer, with enabled/dirty flags.
//! - `Scope` / `Dispose`: teardown of everything an edit session set up.
//!
//! ## Signals
//!
//! ```rust
//! use shelf_core::*;
//!
//! let state = signal(ValidationState::Valid);
//! let guard = state.watch(|s| log::debug!("field is now {s:?}"));
//! state.set(ValidationState::Invalid(FieldError::AlreadyTaken));
//! guard.run(); // unsubscribes
//! assert_eq!(state.subscriber_count(), 0);
//! ```
//!
//! ## Form trees
//!
//! ```rust
//! use serde_json::json;
//! use shelf_core::*;
//!
//! let mut form = FormTree::new();
//! form.insert(DataPointer::key("name"), json!("Short loans"));
//! form.insert(DataPointer::parse("/renewal/duration").unwrap(), json!(7));
//! form.set_enabled(&DataPointer::key("renewal"), false).unwrap();
//! assert_eq!(form.value(), json!({"name": "Short loans"}));
//! ```
//!
//! ## Scopes
//!
//! Subscriptions made for an edit session go into its `Scope`; disposing the
//! scope releases them all, children first.

pub mod config;
pub mod control;
pub mod effects;
pub mod error;
pub mod kind;
pub mod pointer;
pub mod scope;
pub mod signal;
pub mod validation;
pub mod value;

pub use config::*;
pub use control::*;
pub use effects::*;
pub use error::*;
pub use kind::*;
pub use pointer::*;
pub use scope::*;
pub use signal::*;
pub use validation::*;
pub use value::*;
