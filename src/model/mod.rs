//! # Bibliographic Record Model
//!
//! Plain DTOs shared by the store, the synthesis engine and callers.
//! No I/O, no state, no locking in here.

pub mod record;
pub mod field_map;
pub mod fields;

pub use record::{Record, RecordId};
pub use field_map::FieldMap;
