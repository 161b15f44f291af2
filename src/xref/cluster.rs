//! Cluster extraction by forward reachability.
//!
//! Each call to [`ClusterExtractor::take_next`] detaches the first remaining
//! source record of the graph and walks outgoing edges depth-first. Every
//! visited source record has its entry removed, so it can neither root nor be
//! re-expanded by a later cluster.
//!
//! ## Limitation
//!
//! The walk only follows outgoing edges of records that are still graph keys.
//! A record reached as a leaf contributes no edges, and nothing ever walks an
//! edge backwards. A cluster is therefore the forward-reachable set of its
//! root, not the undirected connected component: two records related through
//! a third one that only points *at* them can end up in different clusters.

use std::collections::HashSet;

use indexmap::IndexSet;

use crate::model::RecordId;
use super::graph::RelationGraph;

/// A group of records believed to share a venue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// The source record the walk started from.
    pub root: RecordId,
    /// Root first, then records in discovery order.
    pub members: IndexSet<RecordId>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.members.contains(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecordId> {
        self.members.iter()
    }
}

/// Drains a [`RelationGraph`] one cluster at a time.
///
/// Besides removing graph entries, the extractor remembers every record it
/// has handed out. A relative claimed by an earlier cluster is neither added
/// to nor walked from a later one, so no record lands in two clusters even
/// when it was reached as a leaf from two different roots.
#[derive(Debug, Clone)]
pub struct ClusterExtractor {
    graph: RelationGraph,
    claimed: HashSet<RecordId>,
}

impl ClusterExtractor {
    pub fn new(graph: RelationGraph) -> Self {
        Self { graph, claimed: HashSet::new() }
    }

    /// Source records not yet consumed by any cluster.
    pub fn remaining(&self) -> usize {
        self.graph.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn is_claimed(&self, id: &RecordId) -> bool {
        self.claimed.contains(id)
    }

    /// Pull the next cluster out of the graph. `None` once the graph is empty.
    pub fn take_next(&mut self) -> Option<Cluster> {
        let (root, first) = self.graph.pop_first()?;

        let mut members = IndexSet::new();
        members.insert(root.clone());
        self.claimed.insert(root.clone());

        // Depth-first over an explicit stack. Relatives are pushed in reverse
        // so they are expanded in list order.
        let mut stack: Vec<RecordId> = Vec::new();
        self.admit(first, &mut members, &mut stack);
        while let Some(next) = stack.pop() {
            if let Some(relatives) = self.graph.take(&next) {
                self.admit(relatives, &mut members, &mut stack);
            }
        }

        Some(Cluster { root, members })
    }

    fn admit(
        &mut self,
        relatives: impl IntoIterator<Item = RecordId>,
        members: &mut IndexSet<RecordId>,
        stack: &mut Vec<RecordId>,
    ) {
        let mut fresh = Vec::new();
        for id in relatives {
            if members.contains(&id) {
                continue;
            }
            if !self.claimed.insert(id.clone()) {
                tracing::debug!(record = %id, "already claimed by an earlier cluster");
                continue;
            }
            members.insert(id.clone());
            fresh.push(id);
        }
        stack.extend(fresh.into_iter().rev());
    }
}

impl Iterator for ClusterExtractor {
    type Item = Cluster;

    fn next(&mut self) -> Option<Cluster> {
        self.take_next()
    }
}
