//! Commit of staged aggregates.
//!
//! One staged aggregate is written inside one read-write transaction. If any
//! edit is rejected the transaction is rolled back and the error returned;
//! aggregates committed earlier are left in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::RecordId;
use crate::storage::RecordStore;
use crate::tx::TxMode;
use crate::xref::StagedAggregate;
use crate::Result;

/// One committed aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSummary {
    pub id: RecordId,
    pub citation_key: Option<String>,
    pub members: Vec<RecordId>,
}

/// Outcome of one engine run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records in the snapshot.
    pub records_scanned: usize,
    /// Snapshot records of the source type.
    pub source_records: usize,
    /// Directed edges in the relation graph.
    pub edges: usize,
    /// Clusters extracted, including skipped ones.
    pub clusters: usize,
    /// Clusters left alone because they had a single member.
    pub skipped_clusters: usize,
    pub fields_cleared: usize,
    pub crossrefs_set: usize,
    pub aggregates: Vec<AggregateSummary>,
}

impl RunReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            records_scanned: 0,
            source_records: 0,
            edges: 0,
            clusters: 0,
            skipped_clusters: 0,
            fields_cleared: 0,
            crossrefs_set: 0,
            aggregates: Vec::new(),
        }
    }

    pub fn aggregates_created(&self) -> usize {
        self.aggregates.len()
    }

    /// Account for a committed aggregate.
    pub fn record(&mut self, staged: &StagedAggregate) {
        self.fields_cleared += staged.clears.len();
        self.crossrefs_set += staged.members.len();
        self.aggregates.push(AggregateSummary {
            id: staged.aggregate.id.clone(),
            citation_key: staged.aggregate.citation_key.clone(),
            members: staged.members.clone(),
        });
    }

    pub fn finish(mut self, at: DateTime<Utc>) -> Self {
        self.finished_at = at;
        self
    }
}

/// Write one staged aggregate to `store` atomically (as far as the store's
/// transactions are atomic).
pub fn commit<S: RecordStore>(store: &S, staged: &StagedAggregate) -> Result<()> {
    let mut tx = store.begin_tx(TxMode::ReadWrite)?;
    if let Err(e) = store.apply_edits(&mut tx, staged.to_edits()) {
        if let Err(rollback) = store.rollback_tx(tx) {
            tracing::warn!(error = %rollback, "rollback after failed write also failed");
        }
        return Err(e);
    }
    store.commit_tx(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{fields, Record};
    use crate::storage::MemoryStore;
    use crate::Error;

    fn staged(members: &[&str]) -> StagedAggregate {
        StagedAggregate {
            aggregate: Record::new("agg", "proceedings")
                .with_field(fields::YEAR, "2020")
                .with_citation_key("proceedings-agg-2020"),
            members: members.iter().map(|m| RecordId::from(*m)).collect(),
            clears: members.iter().map(|m| (RecordId::from(*m), fields::YEAR.to_string())).collect(),
            crossref: "proceedings-agg-2020".into(),
        }
    }

    #[test]
    fn test_commit_applies_all_edits() {
        let db = MemoryStore::from_records([
            Record::new("a", "inproceedings").with_field(fields::YEAR, "2020"),
            Record::new("b", "inproceedings").with_field(fields::YEAR, "2020"),
        ]).unwrap();
        commit(&db, &staged(&["a", "b"])).unwrap();

        let tx = db.begin_tx(TxMode::ReadOnly).unwrap();
        assert_eq!(db.record_count(&tx).unwrap(), 3);
        let a = db.get_record(&tx, &"a".into()).unwrap().unwrap();
        assert!(!a.has(fields::YEAR));
        assert_eq!(a.get(fields::CROSSREF), Some("proceedings-agg-2020"));
    }

    #[test]
    fn test_failed_commit_leaves_store_untouched() {
        let db = MemoryStore::from_records([
            Record::new("a", "inproceedings").with_field(fields::YEAR, "2020"),
        ]).unwrap();
        let err = commit(&db, &staged(&["a", "gone"])).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let tx = db.begin_tx(TxMode::ReadOnly).unwrap();
        assert_eq!(db.record_count(&tx).unwrap(), 1);
        let a = db.get_record(&tx, &"a".into()).unwrap().unwrap();
        assert_eq!(a.get(fields::YEAR), Some("2020"));
    }

    #[test]
    fn test_report_accounting() {
        let mut report = RunReport::new(Utc::now());
        report.record(&staged(&["a", "b"]));
        assert_eq!(report.aggregates_created(), 1);
        assert_eq!(report.fields_cleared, 2);
        assert_eq!(report.crossrefs_set, 2);
        assert_eq!(report.aggregates[0].citation_key.as_deref(), Some("proceedings-agg-2020"));
    }
}
