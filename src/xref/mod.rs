//! # Cross-Reference Synthesis
//!
//! The algorithmic core, leaf-first:
//!
//! 1. [`relatedness`] — word-overlap test between two venue strings
//! 2. [`graph`] — directed relation graph over a record snapshot
//! 3. [`cluster`] — forward-reachable clusters drained from the graph
//! 4. [`keygen`] — random citation key parts
//! 5. [`synthesis`] — one staged aggregate per cluster
//!
//! Everything in here works on an in-memory [`Snapshot`]; only
//! `crate::execution` writes to a store.

pub mod relatedness;
pub mod graph;
pub mod cluster;
pub mod keygen;
pub mod synthesis;

use indexmap::IndexMap;

use crate::config::RecordOrder;
use crate::model::{Record, RecordId};
use crate::{Error, Result};

pub use relatedness::related;
pub use graph::{RelationGraph, Relatives};
pub use cluster::{Cluster, ClusterExtractor};
pub use keygen::{KeyGenerator, RandomKeyGenerator};
pub use synthesis::{synthesize, StagedAggregate};

/// Point-in-time copy of a store's records, in processing order.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: IndexMap<RecordId, Record>,
}

impl Snapshot {
    /// Arrange `records` by `order`. Duplicate ids violate the store contract.
    pub fn new(mut records: Vec<Record>, order: RecordOrder) -> Result<Self> {
        match order {
            RecordOrder::Store => {}
            RecordOrder::ById => records.sort_by(|a, b| a.id.cmp(&b.id)),
            RecordOrder::ByCitationKey => records.sort_by(|a, b| {
                (a.citation_key.is_none(), &a.citation_key, &a.id)
                    .cmp(&(b.citation_key.is_none(), &b.citation_key, &b.id))
            }),
        }

        let mut map = IndexMap::with_capacity(records.len());
        for record in records {
            if map.contains_key(&record.id) {
                return Err(Error::Precondition(format!(
                    "record id {} appears twice in the snapshot",
                    record.id
                )));
            }
            map.insert(record.id.clone(), record);
        }
        Ok(Self { records: map })
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.records.get(id)
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(snapshot: &Snapshot) -> Vec<&str> {
        snapshot.records().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_orders() {
        let records = vec![
            Record::new("b", "inproceedings").with_citation_key("k2"),
            Record::new("c", "inproceedings"),
            Record::new("a", "inproceedings").with_citation_key("k1"),
        ];
        assert_eq!(ids(&Snapshot::new(records.clone(), RecordOrder::Store).unwrap()), vec!["b", "c", "a"]);
        assert_eq!(ids(&Snapshot::new(records.clone(), RecordOrder::ById).unwrap()), vec!["a", "b", "c"]);
        assert_eq!(ids(&Snapshot::new(records, RecordOrder::ByCitationKey).unwrap()), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let records = vec![Record::new("a", "x"), Record::new("a", "y")];
        assert!(matches!(
            Snapshot::new(records, RecordOrder::Store),
            Err(Error::Precondition(_))
        ));
    }
}
