//! # bibxref — Bibliographic Cross-Reference Synthesis
//!
//! Finds conference papers that appear in the same proceedings, creates one
//! proceedings record per group, moves the venue fields (`booktitle`,
//! `publisher`, `year`, ...) onto it and points every paper at it through
//! `crossref`.
//!
//! ## Design Principles
//!
//! 1. **Trait-first**: `RecordStore` is the contract between engine and storage
//! 2. **Clean DTOs**: `Record`, `RecordId`, `FieldMap` cross all boundaries
//! 3. **Pure core**: graph building, clustering and synthesis never touch a store
//! 4. **One transaction per aggregate**: a cluster is committed whole or not at all
//!
//! ## Quick Start
//!
//! ```rust
//! use bibxref::{CrossRefEngine, EngineConfig, Record};
//!
//! # fn example() -> bibxref::Result<()> {
//! let mut engine = CrossRefEngine::open_memory(
//!     [
//!         Record::new("p1", "inproceedings")
//!             .with_field("booktitle", "Proc ACM SIGCOMM")
//!             .with_field("year", "2020"),
//!         Record::new("p2", "inproceedings")
//!             .with_field("booktitle", "ACM SIGCOMM 2020")
//!             .with_field("year", "2020"),
//!     ],
//!     EngineConfig::default().with_seed(7),
//! )?;
//!
//! let report = engine.run()?;
//! assert_eq!(report.aggregates_created(), 1);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod model;
pub mod config;
pub mod xref;
pub mod execution;
pub mod storage;
pub mod tx;

use chrono::Utc;

// ============================================================================
// Re-exports
// ============================================================================

pub use model::{FieldMap, Record, RecordId};
pub use config::{EngineConfig, RecordOrder};
pub use storage::{MemoryStore, RecordStore, StoreEdit};
pub use tx::{Transaction, TxId, TxMode};
pub use execution::{AggregateSummary, RunReport};
pub use xref::{
    Cluster, ClusterExtractor, KeyGenerator, RandomKeyGenerator, RelationGraph, Snapshot,
    StagedAggregate,
};

// ============================================================================
// Top-level engine handle
// ============================================================================

/// The primary entry point. A `CrossRefEngine` wraps a record store, a
/// configuration and a key generator.
///
/// A run takes a snapshot of the store, builds the relation graph once, then
/// alternates cluster extraction and synthesis until the graph is drained,
/// committing each aggregate as soon as it is synthesized.
pub struct CrossRefEngine<S: RecordStore, G: KeyGenerator = RandomKeyGenerator> {
    store: S,
    config: EngineConfig,
    keygen: G,
}

impl<S: RecordStore> CrossRefEngine<S> {
    /// Default configuration, entropy-seeded keys.
    pub fn with_store(store: S) -> Self {
        Self {
            store,
            config: EngineConfig::default(),
            keygen: RandomKeyGenerator::from_entropy(),
        }
    }

    /// Validate `config` and build the key generator it describes.
    pub fn with_config(store: S, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let keygen = match config.seed {
            Some(seed) => RandomKeyGenerator::seeded(seed),
            None => RandomKeyGenerator::from_entropy(),
        }
        .with_length(config.key_length);
        Ok(Self { store, config, keygen })
    }
}

/// In-memory engine for testing and embedding.
impl CrossRefEngine<MemoryStore> {
    pub fn open_memory(
        records: impl IntoIterator<Item = Record>,
        config: EngineConfig,
    ) -> Result<Self> {
        Self::with_config(MemoryStore::from_records(records)?, config)
    }
}

impl<S: RecordStore, G: KeyGenerator> CrossRefEngine<S, G> {
    /// Swap in another key generator. `key_length` and `seed` from the
    /// configuration no longer apply.
    pub fn with_key_generator<H: KeyGenerator>(self, keygen: H) -> CrossRefEngine<S, H> {
        CrossRefEngine { store: self.store, config: self.config, keygen }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Synthesize and commit aggregates for every cluster in the store.
    ///
    /// Any failure abandons the run and surfaces as `Error::RunFailed`.
    /// Aggregates committed before the failure stay committed.
    pub fn run(&mut self) -> Result<RunReport> {
        let span = tracing::info_span!("crossref_run", source_type = %self.config.source_type);
        let _guard = span.enter();

        let mut report = RunReport::new(Utc::now());
        let outcome = self.drive(&mut report, |store, staged| execution::commit(store, staged));

        match outcome {
            Ok(()) => {
                tracing::info!(
                    aggregates = report.aggregates_created(),
                    skipped = report.skipped_clusters,
                    "cross-references generated"
                );
                Ok(report.finish(Utc::now()))
            }
            Err(e) => {
                let committed = report.aggregates_created();
                tracing::error!(error = %e, committed, "problem generating cross-references");
                Err(Error::RunFailed { committed, source: Box::new(e) })
            }
        }
    }

    /// Dry run: the aggregates `run` would commit, without writing anything.
    ///
    /// Draws citation keys from the generator, so a following `run` produces
    /// different keys unless the generator is reset.
    pub fn plan(&mut self) -> Result<Vec<StagedAggregate>> {
        let mut report = RunReport::new(Utc::now());
        let mut staged_all = Vec::new();
        self.drive(&mut report, |_, staged| {
            staged_all.push(staged.clone());
            Ok(())
        })?;
        Ok(staged_all)
    }

    fn snapshot(&self) -> Result<Snapshot> {
        let tx = self.store.begin_tx(TxMode::ReadOnly)?;
        let records = self.store.all_records(&tx)?;
        self.store.commit_tx(tx)?;

        tracing::info!(records = records.len(), "snapshot taken");
        for record in &records {
            tracing::debug!(
                record = %record.id,
                entry_type = %record.entry_type,
                fields = ?record.fields.names().collect::<Vec<_>>(),
                "snapshot record"
            );
        }
        Snapshot::new(records, self.config.order)
    }

    fn drive<F>(&mut self, report: &mut RunReport, mut on_staged: F) -> Result<()>
    where
        F: FnMut(&S, &StagedAggregate) -> Result<()>,
    {
        let snapshot = self.snapshot()?;
        report.records_scanned = snapshot.len();
        report.source_records = snapshot
            .records()
            .filter(|r| r.is_type(&self.config.source_type))
            .count();

        let graph = RelationGraph::build(snapshot.records(), &self.config.source_type)?;
        report.edges = graph.edge_count();
        tracing::debug!(sources = graph.len(), edges = report.edges, "relation graph built");

        let mut extractor = ClusterExtractor::new(graph);
        while let Some(cluster) = extractor.take_next() {
            report.clusters += 1;
            if cluster.len() < 2 {
                tracing::debug!(root = %cluster.root, "all relatives already claimed, cluster skipped");
                report.skipped_clusters += 1;
                continue;
            }

            let staged = xref::synthesize(&cluster, &snapshot, &self.config, &mut self.keygen)?;
            on_staged(&self.store, &staged)?;
            tracing::info!(
                aggregate = %staged.aggregate.id,
                citation_key = staged.citation_key().unwrap_or_default(),
                members = staged.members.len(),
                "aggregate synthesized"
            );
            report.record(&staged);
        }
        Ok(())
    }
}

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Transaction error: {0}")]
    TxError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Cross-reference run failed after {committed} committed aggregate(s): {source}")]
    RunFailed {
        committed: usize,
        source: Box<Error>,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
