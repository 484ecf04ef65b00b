//! Read-only reference catalog with a normalised-name index.
//!
//! Every record is indexed under the normalised form of its vernacular name
//! and of its scientific name. When both forms are equal the record appears
//! once under that key. The index is a `BTreeMap`, so the name universe
//! iterates in lexicographic order and best-match tie-breaking is stable.

use std::collections::BTreeMap;

use tracing::{info, warn};

use crate::normalize::normalize_name;
use crate::record::SpeciesRecord;

/// Immutable catalog of known species, built once per session.
#[derive(Debug, Clone, Default)]
pub struct ReferenceCatalog {
    records: Vec<SpeciesRecord>,
    /// normalised name → positions in `records`, ascending
    index: BTreeMap<String, Vec<usize>>,
    unindexed: usize,
}

/// Summary statistics for a catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogSummary {
    pub records: usize,
    pub normalized_names: usize,
    /// Records with neither a vernacular nor a scientific name.
    pub unindexed: usize,
}

/// Build a catalog from an ordered sequence of records.
pub fn build_catalog(records: impl IntoIterator<Item = SpeciesRecord>) -> ReferenceCatalog {
    ReferenceCatalog::build(records)
}

impl ReferenceCatalog {
    /// Build the catalog and its name index.
    ///
    /// A name that normalises to the empty string is not indexed. A record
    /// with no usable name at all is kept in [`records`](Self::records) but
    /// never reachable through matching.
    pub fn build(records: impl IntoIterator<Item = SpeciesRecord>) -> Self {
        let records: Vec<SpeciesRecord> = records.into_iter().collect();
        let mut index: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut unindexed = 0usize;

        for (pos, record) in records.iter().enumerate() {
            let vernacular = normalize_name(&record.vernacular_name);
            let scientific = normalize_name(&record.scientific_name);

            if vernacular.is_empty() && scientific.is_empty() {
                warn!(row = pos, "catalog record has no name, not indexed");
                unindexed += 1;
                continue;
            }
            if !vernacular.is_empty() {
                index.entry(vernacular.clone()).or_default().push(pos);
            }
            if !scientific.is_empty() && scientific != vernacular {
                index.entry(scientific).or_default().push(pos);
            }
        }

        info!(
            records = records.len(),
            names = index.len(),
            unindexed,
            "built reference catalog"
        );

        Self {
            records,
            index,
            unindexed,
        }
    }

    /// Every distinct normalised name, in lexicographic order.
    pub fn normalized_universe(&self) -> impl Iterator<Item = &str> + '_ {
        self.index.keys().map(String::as_str)
    }

    /// Number of distinct normalised names.
    pub fn universe_len(&self) -> usize {
        self.index.len()
    }

    /// All records whose normalised vernacular or scientific name equals
    /// `name`, in catalog order. Empty when nothing matches.
    pub fn records_for_normalized_name(&self, name: &str) -> Vec<&SpeciesRecord> {
        self.index
            .get(name)
            .map(|positions| positions.iter().map(|&i| &self.records[i]).collect())
            .unwrap_or_default()
    }

    /// All records in their original order.
    pub fn records(&self) -> &[SpeciesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> CatalogSummary {
        CatalogSummary {
            records: self.records.len(),
            normalized_names: self.index.len(),
            unindexed: self.unindexed,
        }
    }
}
