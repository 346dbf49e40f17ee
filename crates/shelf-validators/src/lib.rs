//! # Field validators
//!
//! - [`UniqueValue`] / [`BarcodeRule`]: ask a [`RecordLookup`] whether a
//!   name, code or barcode is already used by another record.
//! - [`FieldValidator`]: runs such a rule for one form field, debouncing
//!   edits and publishing only the newest answer to the field's state.
//! - [`OpeningHours`]: synchronous checks on `HH:MM` time ranges.
//!
//! Lookups are plain async calls returning `Result`. A check that has been
//! superseded still runs to completion, but its answer is dropped.

pub mod error;
pub mod gate;
pub mod hours;
pub mod lookup;
pub mod unique;

pub use error::*;
pub use gate::*;
pub use hours::*;
pub use lookup::*;
pub use unique::*;
