//! # Record editors
//!
//! Glue between the form engine and the outside world:
//!
//! - [`RecordService`]: get/list/create/update against the record API.
//! - [`History`]: the back stack editors navigate on.
//! - [`EditorSession`]: one record being edited, from load to save.
//! - [`MemoryRecordService`]: an in-memory API for demos and tests.

pub mod history;
pub mod memory;
pub mod record;
pub mod service;
pub mod session;

pub use history::*;
pub use memory::*;
pub use record::*;
pub use service::*;
pub use session::*;
