//! Engine configuration.
//!
//! Every knob has a default matching conference-paper → proceedings
//! aggregation, so `EngineConfig::default()` is usable as is. Configs can be
//! loaded from JSON; missing keys fall back to the defaults.

use serde::{Deserialize, Serialize};

use crate::model::fields::VENUE_FIELDS;
use crate::{Error, Result};

/// Order in which the snapshot is fed to the graph builder.
///
/// Root selection and first-found field harvesting both follow this order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordOrder {
    /// Whatever order the store enumerates records in.
    #[default]
    Store,
    /// Sorted by record id.
    ById,
    /// Sorted by citation key; records without one go last, ties by id.
    ByCitationKey,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Type tag of records that seek relatives and get grouped.
    pub source_type: String,
    /// Type tag given to synthesized aggregates.
    pub aggregate_type: String,
    /// First component of generated citation keys.
    pub key_prefix: String,
    pub key_separator: String,
    /// Length of the random citation key part.
    pub key_length: usize,
    /// Fields moved from members to the aggregate, in harvesting order.
    pub managed_fields: Vec<String>,
    /// Written to `crossref` when an aggregate has no citation key.
    pub crossref_placeholder: String,
    pub order: RecordOrder,
    /// Seed for citation key generation. `None` uses OS entropy.
    pub seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            source_type: "inproceedings".into(),
            aggregate_type: "proceedings".into(),
            key_prefix: "proceedings".into(),
            key_separator: "-".into(),
            key_length: 10,
            managed_fields: VENUE_FIELDS.iter().map(|f| f.to_string()).collect(),
            crossref_placeholder: "undefined".into(),
            order: RecordOrder::Store,
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_order(mut self, order: RecordOrder) -> Self {
        self.order = order;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.source_type.trim().is_empty() {
            return Err(Error::Config("source_type must not be empty".into()));
        }
        if self.aggregate_type.trim().is_empty() {
            return Err(Error::Config("aggregate_type must not be empty".into()));
        }
        if self.source_type.eq_ignore_ascii_case(&self.aggregate_type) {
            return Err(Error::Config(format!(
                "source_type and aggregate_type are both '{}'",
                self.source_type
            )));
        }
        if self.key_length == 0 {
            return Err(Error::Config("key_length must be at least 1".into()));
        }
        if self.managed_fields.is_empty() {
            return Err(Error::Config("managed_fields must not be empty".into()));
        }
        if self.managed_fields.iter().any(|f| f.is_empty()) {
            return Err(Error::Config("managed_fields contains an empty name".into()));
        }
        Ok(())
    }
}
