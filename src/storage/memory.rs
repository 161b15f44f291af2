//! In-memory record store.
//!
//! This is the reference implementation of `RecordStore`. Records live in an
//! insertion-ordered map behind a single `RwLock`.
//!
//! ## Transactions
//!
//! - Writes issued in a `ReadWrite` transaction are buffered on the
//!   transaction and applied on `commit_tx()` under one write lock, after every
//!   buffered edit has been validated. A failed commit applies nothing.
//! - `rollback_tx()` drops the buffer.
//! - Reads go straight to the committed state; a transaction does not see its
//!   own pending writes.
//! - Writes in a `ReadOnly` transaction fail immediately.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::model::*;
use crate::tx::{Transaction, TxMode, TxId};
use crate::{Error, Result};
use super::{RecordStore, StoreEdit};

// ============================================================================
// MemoryStore
// ============================================================================

/// In-memory bibliography.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

struct MemoryInner {
    records: RwLock<IndexMap<RecordId, Record>>,
    next_tx_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                records: RwLock::new(IndexMap::new()),
                next_tx_id: AtomicU64::new(1),
            }),
        }
    }

    /// Build a store pre-populated with `records`, keeping their order.
    pub fn from_records(records: impl IntoIterator<Item = Record>) -> Result<Self> {
        let store = Self::new();
        {
            let mut map = store.inner.records.write();
            for record in records {
                if map.contains_key(&record.id) {
                    return Err(Error::ConstraintViolation(format!(
                        "duplicate record id {}",
                        record.id
                    )));
                }
                map.insert(record.id.clone(), record);
            }
        }
        Ok(store)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MemoryTx
// ============================================================================

/// In-memory transaction: a write buffer applied on commit.
pub struct MemoryTx {
    id: TxId,
    mode: TxMode,
    pending: Vec<StoreEdit>,
}

impl MemoryTx {
    /// Number of buffered, not yet committed edits.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    fn push(&mut self, edit: StoreEdit) -> Result<()> {
        if !self.is_writable() {
            return Err(Error::TxError(format!(
                "write to {} in read-only transaction {}",
                edit.target(),
                self.id
            )));
        }
        self.pending.push(edit);
        Ok(())
    }
}

impl Transaction for MemoryTx {
    fn mode(&self) -> TxMode { self.mode }
    fn id(&self) -> TxId { self.id }
}

/// Check that every buffered edit can be applied, in order.
fn validate(records: &IndexMap<RecordId, Record>, edits: &[StoreEdit]) -> Result<()> {
    let mut inserted: HashSet<&RecordId> = HashSet::new();
    for edit in edits {
        match edit {
            StoreEdit::Insert(record) => {
                if records.contains_key(&record.id) || !inserted.insert(&record.id) {
                    return Err(Error::ConstraintViolation(format!(
                        "record id {} already exists",
                        record.id
                    )));
                }
            }
            other => {
                let id = other.target();
                if !records.contains_key(id) && !inserted.contains(id) {
                    return Err(Error::NotFound(format!("Record {id}")));
                }
            }
        }
    }
    Ok(())
}

fn apply(records: &mut IndexMap<RecordId, Record>, edit: StoreEdit) {
    match edit {
        StoreEdit::Insert(record) => {
            records.insert(record.id.clone(), record);
        }
        StoreEdit::SetField { id, name, value } => {
            if let Some(record) = records.get_mut(&id) {
                record.fields.set(name, value);
            }
        }
        StoreEdit::ClearField { id, name } => {
            if let Some(record) = records.get_mut(&id) {
                record.fields.clear(&name);
            }
        }
        StoreEdit::SetCitationKey { id, key } => {
            if let Some(record) = records.get_mut(&id) {
                record.citation_key = key;
            }
        }
    }
}

// ============================================================================
// RecordStore impl
// ============================================================================

impl RecordStore for MemoryStore {
    type Tx = MemoryTx;

    fn begin_tx(&self, mode: TxMode) -> Result<MemoryTx> {
        let id = TxId(self.inner.next_tx_id.fetch_add(1, Ordering::Relaxed));
        Ok(MemoryTx { id, mode, pending: Vec::new() })
    }

    fn commit_tx(&self, tx: MemoryTx) -> Result<()> {
        if tx.pending.is_empty() {
            return Ok(());
        }
        let mut records = self.inner.records.write();
        validate(&records, &tx.pending)?;
        for edit in tx.pending {
            apply(&mut records, edit);
        }
        Ok(())
    }

    fn rollback_tx(&self, _tx: MemoryTx) -> Result<()> {
        Ok(())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    fn all_records(&self, _tx: &MemoryTx) -> Result<Vec<Record>> {
        Ok(self.inner.records.read().values().cloned().collect())
    }

    fn get_record(&self, _tx: &MemoryTx, id: &RecordId) -> Result<Option<Record>> {
        Ok(self.inner.records.read().get(id).cloned())
    }

    fn record_count(&self, _tx: &MemoryTx) -> Result<u64> {
        Ok(self.inner.records.read().len() as u64)
    }

    // ========================================================================
    // Writes (buffered)
    // ========================================================================

    fn insert_record(&self, tx: &mut MemoryTx, record: Record) -> Result<()> {
        tx.push(StoreEdit::Insert(record))
    }

    fn set_field(&self, tx: &mut MemoryTx, id: &RecordId, name: &str, value: &str) -> Result<()> {
        tx.push(StoreEdit::SetField {
            id: id.clone(),
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    fn clear_field(&self, tx: &mut MemoryTx, id: &RecordId, name: &str) -> Result<()> {
        tx.push(StoreEdit::ClearField { id: id.clone(), name: name.to_string() })
    }

    fn set_citation_key(&self, tx: &mut MemoryTx, id: &RecordId, key: Option<&str>) -> Result<()> {
        tx.push(StoreEdit::SetCitationKey { id: id.clone(), key: key.map(str::to_string) })
    }

    fn apply_edits(&self, tx: &mut MemoryTx, edits: Vec<StoreEdit>) -> Result<()> {
        if !tx.is_writable() && !edits.is_empty() {
            return Err(Error::TxError(format!("batch write in read-only transaction {}", tx.id)));
        }
        tx.pending.extend(edits);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fields;

    fn paper(id: &str) -> Record {
        Record::new(id, "inproceedings").with_field(fields::BOOKTITLE, "Proc X")
    }

    #[test]
    fn test_insert_visible_after_commit() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();
        db.insert_record(&mut tx, paper("a")).unwrap();

        assert_eq!(tx.pending(), 1);
        assert_eq!(db.record_count(&tx).unwrap(), 0);

        db.commit_tx(tx).unwrap();
        let tx = db.begin_tx(TxMode::ReadOnly).unwrap();
        assert_eq!(db.record_count(&tx).unwrap(), 1);
        assert!(db.get_record(&tx, &"a".into()).unwrap().is_some());
    }

    #[test]
    fn test_rollback_discards_writes() {
        let db = MemoryStore::from_records([paper("a")]).unwrap();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();
        db.clear_field(&mut tx, &"a".into(), fields::BOOKTITLE).unwrap();
        db.rollback_tx(tx).unwrap();

        let tx = db.begin_tx(TxMode::ReadOnly).unwrap();
        let rec = db.get_record(&tx, &"a".into()).unwrap().unwrap();
        assert_eq!(rec.get(fields::BOOKTITLE), Some("Proc X"));
    }

    #[test]
    fn test_read_only_tx_rejects_writes() {
        let db = MemoryStore::from_records([paper("a")]).unwrap();
        let mut tx = db.begin_tx(TxMode::ReadOnly).unwrap();
        let err = db.set_field(&mut tx, &"a".into(), fields::YEAR, "2020").unwrap_err();
        assert!(matches!(err, Error::TxError(_)));
    }

    #[test]
    fn test_failed_commit_applies_nothing() {
        let db = MemoryStore::from_records([paper("a")]).unwrap();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();
        db.set_field(&mut tx, &"a".into(), fields::CROSSREF, "p1").unwrap();
        db.set_field(&mut tx, &"missing".into(), fields::CROSSREF, "p1").unwrap();

        let err = db.commit_tx(tx).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let tx = db.begin_tx(TxMode::ReadOnly).unwrap();
        let rec = db.get_record(&tx, &"a".into()).unwrap().unwrap();
        assert!(!rec.has(fields::CROSSREF));
    }

    #[test]
    fn test_duplicate_insert_is_constraint_violation() {
        let db = MemoryStore::from_records([paper("a")]).unwrap();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();
        db.insert_record(&mut tx, paper("a")).unwrap();
        assert!(matches!(db.commit_tx(tx), Err(Error::ConstraintViolation(_))));

        assert!(MemoryStore::from_records([paper("b"), paper("b")]).is_err());
    }

    #[test]
    fn test_edits_on_record_inserted_in_same_tx() {
        let db = MemoryStore::new();
        let mut tx = db.begin_tx(TxMode::ReadWrite).unwrap();
        db.apply_edits(&mut tx, vec![
            StoreEdit::Insert(Record::new("p", "proceedings")),
            StoreEdit::SetField { id: "p".into(), name: "year".into(), value: "2020".into() },
            StoreEdit::SetCitationKey { id: "p".into(), key: Some("proc-2020".into()) },
        ]).unwrap();
        db.commit_tx(tx).unwrap();

        let tx = db.begin_tx(TxMode::ReadOnly).unwrap();
        let rec = db.get_record(&tx, &"p".into()).unwrap().unwrap();
        assert_eq!(rec.get("year"), Some("2020"));
        assert_eq!(rec.citation_key.as_deref(), Some("proc-2020"));
    }

    #[test]
    fn test_all_records_keeps_insertion_order() {
        let db = MemoryStore::from_records([paper("z"), paper("a"), paper("m")]).unwrap();
        let tx = db.begin_tx(TxMode::ReadOnly).unwrap();
        let ids: Vec<String> = db.all_records(&tx).unwrap().into_iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_records_by_type() {
        let db = MemoryStore::from_records([
            paper("a"),
            Record::new("b", "Article"),
            Record::new("c", "INPROCEEDINGS"),
        ]).unwrap();
        let tx = db.begin_tx(TxMode::ReadOnly).unwrap();
        assert_eq!(db.records_by_type(&tx, "inproceedings").unwrap().len(), 2);
        assert_eq!(db.records_by_type(&tx, "article").unwrap().len(), 1);
    }
}
