//! # Record Store Trait
//!
//! The contract between the cross-reference engine and whatever holds the
//! bibliography. The engine only ever talks to a store through this trait.
//!
//! ## Implementations
//!
//! | Store | Module | Description |
//! |-------|--------|-------------|
//! | `MemoryStore` | `memory` | In-memory, insertion-ordered, buffered transactions |

pub mod memory;

use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::tx::{Transaction, TxMode};
use crate::Result;

pub use memory::MemoryStore;

// ============================================================================
// Store edits
// ============================================================================

/// A single write against a record store.
///
/// Used for batch application and by stores that buffer writes until commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreEdit {
    /// Insert a brand new record.
    Insert(Record),
    /// Set (upsert) a field on an existing record.
    SetField { id: RecordId, name: String, value: String },
    /// Remove a field from an existing record. No-op when absent.
    ClearField { id: RecordId, name: String },
    /// Replace the citation key of an existing record.
    SetCitationKey { id: RecordId, key: Option<String> },
}

impl StoreEdit {
    /// The record this edit targets.
    pub fn target(&self) -> &RecordId {
        match self {
            StoreEdit::Insert(record) => &record.id,
            StoreEdit::SetField { id, .. }
            | StoreEdit::ClearField { id, .. }
            | StoreEdit::SetCitationKey { id, .. } => id,
        }
    }
}

// ============================================================================
// RecordStore Trait
// ============================================================================

/// The record store contract.
///
/// Reads take `&Self::Tx`, writes take `&mut Self::Tx`. Whether writes become
/// visible immediately or on commit is up to the implementation; the engine
/// only relies on commit making them durable and rollback discarding whatever
/// the store has not applied yet.
pub trait RecordStore: Send + Sync {
    /// The transaction type for this store.
    type Tx: Transaction;

    // ========================================================================
    // Transactions
    // ========================================================================

    fn begin_tx(&self, mode: TxMode) -> Result<Self::Tx>;

    fn commit_tx(&self, tx: Self::Tx) -> Result<()>;

    fn rollback_tx(&self, tx: Self::Tx) -> Result<()>;

    // ========================================================================
    // Reads
    // ========================================================================

    /// All records, in an order that is stable for the duration of one run.
    fn all_records(&self, tx: &Self::Tx) -> Result<Vec<Record>>;

    /// Get a record by id. Returns None if not found.
    fn get_record(&self, tx: &Self::Tx, id: &RecordId) -> Result<Option<Record>>;

    /// Total number of records.
    fn record_count(&self, tx: &Self::Tx) -> Result<u64>;

    /// All records whose type tag matches (case-insensitive).
    ///
    /// Default: filtered `all_records` scan.
    fn records_by_type(&self, tx: &Self::Tx, entry_type: &str) -> Result<Vec<Record>> {
        Ok(self
            .all_records(tx)?
            .into_iter()
            .filter(|r| r.is_type(entry_type))
            .collect())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Insert a new record. Fails if the id is already taken.
    fn insert_record(&self, tx: &mut Self::Tx, record: Record) -> Result<()>;

    /// Set a field on a record (upsert). An empty value clears the field.
    fn set_field(&self, tx: &mut Self::Tx, id: &RecordId, name: &str, value: &str) -> Result<()>;

    /// Remove a field from a record.
    fn clear_field(&self, tx: &mut Self::Tx, id: &RecordId, name: &str) -> Result<()>;

    /// Replace a record's citation key.
    fn set_citation_key(&self, tx: &mut Self::Tx, id: &RecordId, key: Option<&str>) -> Result<()>;

    /// Apply a batch of edits in order.
    ///
    /// Default falls back to the single-edit methods.
    fn apply_edits(&self, tx: &mut Self::Tx, edits: Vec<StoreEdit>) -> Result<()> {
        for edit in edits {
            match edit {
                StoreEdit::Insert(record) => self.insert_record(tx, record)?,
                StoreEdit::SetField { id, name, value } => self.set_field(tx, &id, &name, &value)?,
                StoreEdit::ClearField { id, name } => self.clear_field(tx, &id, &name)?,
                StoreEdit::SetCitationKey { id, key } => {
                    self.set_citation_key(tx, &id, key.as_deref())?
                }
            }
        }
        Ok(())
    }
}
