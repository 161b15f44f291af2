//! Directed relation graph over one snapshot.
//!
//! Keys are source records that found at least one relative; values are the
//! relatives in encounter order. Keys keep insertion order, which is the
//! snapshot order of the source records.

use indexmap::IndexMap;
use smallvec::SmallVec;

use crate::model::{fields, Record, RecordId};
use crate::Result;
use super::relatedness::related;

/// Outgoing edges of one source record.
pub type Relatives = SmallVec<[RecordId; 4]>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationGraph {
    adjacency: IndexMap<RecordId, Relatives>,
}

/// Text a record uses to look for relatives: `booktitle`, else `journal`.
///
/// Text without any word counts as missing, so the record is skipped rather
/// than failing the run. A present but blank `booktitle` still shadows
/// `journal`: the fallback only applies when `booktitle` is absent.
pub fn reference_text(record: &Record) -> Option<&str> {
    record
        .get(fields::BOOKTITLE)
        .or_else(|| record.get(fields::JOURNAL))
        .filter(|text| text.split_whitespace().next().is_some())
}

impl RelationGraph {
    /// Scan `records` once and collect every directed edge between records of
    /// `source_type`.
    ///
    /// The source side uses [`reference_text`]; the candidate side is always
    /// the candidate's `booktitle`, never its `journal`.
    pub fn build<'a>(
        records: impl IntoIterator<Item = &'a Record>,
        source_type: &str,
    ) -> Result<Self> {
        let sources: Vec<&Record> = records.into_iter().filter(|r| r.is_type(source_type)).collect();
        let candidates: Vec<(&RecordId, &str)> = sources
            .iter()
            .filter_map(|r| r.get(fields::BOOKTITLE).map(|title| (&r.id, title)))
            .collect();

        let mut graph = RelationGraph::default();
        for record in &sources {
            let Some(reference) = reference_text(record) else {
                tracing::debug!(record = %record.id, "no booktitle or journal, skipped");
                continue;
            };

            let mut relatives = Relatives::new();
            for (candidate_id, candidate_text) in &candidates {
                if *candidate_id == &record.id {
                    continue;
                }
                if related(reference, candidate_text)? {
                    relatives.push((*candidate_id).clone());
                }
            }

            if !relatives.is_empty() {
                tracing::debug!(
                    record = %record.id,
                    relatives = ?relatives.iter().map(RecordId::as_str).collect::<Vec<_>>(),
                    "relatives found"
                );
                graph.adjacency.insert(record.id.clone(), relatives);
            }
        }
        Ok(graph)
    }

    /// Build a graph from explicit adjacency lists. Empty lists are dropped.
    pub fn from_adjacency<I, R>(edges: I) -> Self
    where
        I: IntoIterator<Item = (RecordId, R)>,
        R: IntoIterator<Item = RecordId>,
    {
        let adjacency = edges
            .into_iter()
            .map(|(src, dsts)| (src, dsts.into_iter().collect::<Relatives>()))
            .filter(|(_, dsts)| !dsts.is_empty())
            .collect();
        Self { adjacency }
    }

    pub fn relatives(&self, id: &RecordId) -> Option<&[RecordId]> {
        self.adjacency.get(id).map(|r| r.as_slice())
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.adjacency.contains_key(id)
    }

    /// Source records with at least one relative, in insertion order.
    pub fn sources(&self) -> impl Iterator<Item = &RecordId> {
        self.adjacency.keys()
    }

    /// Number of source records.
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|r| r.len()).sum()
    }

    /// Detach and return the first remaining source record and its relatives.
    pub(crate) fn pop_first(&mut self) -> Option<(RecordId, Relatives)> {
        self.adjacency.shift_remove_index(0)
    }

    /// Remove a source record's entry, returning its relatives.
    pub(crate) fn take(&mut self, id: &RecordId) -> Option<Relatives> {
        self.adjacency.shift_remove(id)
    }
}
