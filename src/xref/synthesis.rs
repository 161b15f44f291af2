//! Aggregate synthesis for one cluster.
//!
//! Synthesis is pure: it reads cluster members from the snapshot and returns a
//! [`StagedAggregate`] describing every write. Nothing reaches the store until
//! the staged aggregate is committed.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::model::{fields, Record, RecordId};
use crate::storage::StoreEdit;
use crate::{Error, Result};
use super::cluster::Cluster;
use super::keygen::KeyGenerator;
use super::Snapshot;

/// Writes for one cluster, ready to commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedAggregate {
    /// The new aggregate record, fields and citation key filled in.
    pub aggregate: Record,
    /// Cluster members in cluster order.
    pub members: Vec<RecordId>,
    /// `(member, field)` pairs present before synthesis, to be cleared.
    pub clears: Vec<(RecordId, String)>,
    /// Value written to every member's `crossref`.
    pub crossref: String,
}

impl StagedAggregate {
    pub fn citation_key(&self) -> Option<&str> {
        self.aggregate.citation_key.as_deref()
    }

    /// Store edits in commit order: insert, clears, crossrefs.
    pub fn to_edits(&self) -> Vec<StoreEdit> {
        let mut edits = Vec::with_capacity(1 + self.clears.len() + self.members.len());
        edits.push(StoreEdit::Insert(self.aggregate.clone()));
        edits.extend(self.clears.iter().map(|(id, name)| StoreEdit::ClearField {
            id: id.clone(),
            name: name.clone(),
        }));
        edits.extend(self.members.iter().map(|id| StoreEdit::SetField {
            id: id.clone(),
            name: fields::CROSSREF.to_string(),
            value: self.crossref.clone(),
        }));
        edits
    }
}

/// Build the aggregate for `cluster`.
///
/// For each managed field, in configured order, the first member (in cluster
/// order) carrying it donates its value to the aggregate, and the field is
/// cleared from all members. A harvested `booktitle` also becomes the
/// aggregate's `title`. The citation key is
/// `prefix <sep> random [<sep> year]`; the aggregate id is the random part.
pub fn synthesize<G>(
    cluster: &Cluster,
    snapshot: &Snapshot,
    config: &EngineConfig,
    keygen: &mut G,
) -> Result<StagedAggregate>
where
    G: KeyGenerator + ?Sized,
{
    if cluster.is_empty() {
        return Err(Error::Precondition("cannot synthesize an empty cluster".into()));
    }
    let members: Vec<&Record> = cluster
        .iter()
        .map(|id| {
            snapshot.get(id).ok_or_else(|| {
                Error::Precondition(format!("cluster member {id} is not in the snapshot"))
            })
        })
        .collect::<Result<_>>()?;

    let mut harvested: Vec<(&str, &str)> = Vec::new();
    let mut clears = Vec::new();
    for name in &config.managed_fields {
        if let Some(value) = members.iter().find_map(|m| m.get(name)) {
            harvested.push((name.as_str(), value));
        }
        for member in &members {
            if member.has(name) {
                clears.push((member.id.clone(), name.clone()));
            }
        }
    }

    let part = keygen.generate();
    if part.is_empty() {
        return Err(Error::Precondition("key generator returned an empty key".into()));
    }

    let mut aggregate = Record::new(RecordId::new(part.clone()), config.aggregate_type.clone());
    for (name, value) in harvested {
        aggregate.fields.set(name, value);
    }
    if let Some(booktitle) = aggregate.get(fields::BOOKTITLE).map(str::to_string) {
        aggregate.fields.set(fields::TITLE, booktitle);
    }

    let sep = &config.key_separator;
    let mut key = format!("{}{sep}{part}", config.key_prefix);
    if let Some(year) = aggregate.get(fields::YEAR) {
        key.push_str(sep);
        key.push_str(year);
    }
    aggregate.citation_key = Some(key);

    // The key is always set above; the placeholder only guards the store
    // contract for callers that stage aggregates without one.
    let crossref = aggregate
        .citation_key
        .clone()
        .unwrap_or_else(|| config.crossref_placeholder.clone());

    Ok(StagedAggregate {
        aggregate,
        members: cluster.iter().cloned().collect(),
        clears,
        crossref,
    })
}
