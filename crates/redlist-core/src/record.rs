//! Reference catalog rows.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One row of the reference catalog.
///
/// `scientific_name` is the identity key for deduplication. Vernacular names
/// are not unique: the same common name can label several taxa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesRecord {
    pub vernacular_name: String,
    pub scientific_name: String,
    /// Passthrough columns from the source file, keyed by header.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: BTreeMap<String, String>,
}

impl SpeciesRecord {
    pub fn new(vernacular_name: impl Into<String>, scientific_name: impl Into<String>) -> Self {
        Self {
            vernacular_name: vernacular_name.into(),
            scientific_name: scientific_name.into(),
            extra: BTreeMap::new(),
        }
    }

    /// Attach a passthrough column.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
