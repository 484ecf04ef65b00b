//! Fuzzy matching of candidate names against the catalog's name universe.
//!
//! Each candidate is scored against every normalised catalog name. The best
//! name wins if it reaches the threshold, and is then expanded back into all
//! catalog records that carry it, one [`MatchResult`] per record.
//!
//! The universe iterates in lexicographic order and only a strictly higher
//! score replaces the current best, so ties resolve to the
//! lexicographically smallest name.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::ReferenceCatalog;
use crate::error::MatchError;
use crate::record::SpeciesRecord;
use crate::similarity::{Scorer, ScorerKind};

/// Default minimum score for a match (inclusive).
pub const DEFAULT_THRESHOLD: u8 = 80;

/// Default number of names returned by [`MatchEngine::top_matches`].
pub const DEFAULT_LOOKUP_LIMIT: usize = 3;

/// A normalised catalog name with its similarity score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredName {
    pub name: String,
    pub score: u8,
}

/// One candidate resolved to one catalog record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult<'a> {
    pub candidate: String,
    pub matched_name: String,
    pub score: u8,
    pub record: &'a SpeciesRecord,
}

/// Matches candidates against a borrowed catalog.
#[derive(Debug, Clone)]
pub struct MatchEngine<'a, S = ScorerKind> {
    catalog: &'a ReferenceCatalog,
    scorer: S,
    threshold: u8,
}

impl<'a> MatchEngine<'a, ScorerKind> {
    /// Engine with the token-sort scorer and the default threshold.
    pub fn with_defaults(catalog: &'a ReferenceCatalog) -> Self {
        Self {
            catalog,
            scorer: ScorerKind::TokenSort,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl<'a, S: Scorer> MatchEngine<'a, S> {
    pub fn new(
        catalog: &'a ReferenceCatalog,
        scorer: S,
        threshold: u8,
    ) -> Result<Self, MatchError> {
        if threshold > 100 {
            return Err(MatchError::InvalidThreshold(threshold));
        }
        Ok(Self {
            catalog,
            scorer,
            threshold,
        })
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Best-scoring catalog name for `candidate`, ignoring the threshold.
    ///
    /// `None` only when the universe is empty.
    pub fn best_match(&self, candidate: &str) -> Option<ScoredName> {
        let mut best: Option<(&str, u8)> = None;
        for name in self.catalog.normalized_universe() {
            let score = self.scorer.score(candidate, name);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((name, score));
                if score == 100 {
                    break;
                }
            }
        }
        best.map(|(name, score)| ScoredName {
            name: name.to_string(),
            score,
        })
    }

    /// Resolve one candidate into zero or more results.
    pub fn match_candidate(&self, candidate: &str) -> Vec<MatchResult<'a>> {
        let best = self.best_match(candidate);
        self.expand(candidate, best.as_ref())
    }

    /// Resolve every candidate. Repeated candidates are scored once.
    pub fn match_all<I>(&self, candidates: I) -> MatchSet<'a>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut seen: HashMap<String, Option<ScoredName>> = HashMap::new();
        let mut inputs = Vec::new();
        let mut results = Vec::new();

        for candidate in candidates {
            let candidate = candidate.as_ref();
            let best = seen
                .entry(candidate.to_string())
                .or_insert_with(|| self.best_match(candidate));
            results.extend(self.expand(candidate, best.as_ref()));
            inputs.push(candidate.to_string());
        }

        let set = MatchSet {
            candidates: inputs,
            results,
        };
        info!(
            candidates = set.distinct_candidate_count(),
            matched_species = set.distinct_species_count(),
            results = set.results.len(),
            threshold = self.threshold,
            "matching complete"
        );
        set
    }

    /// Up to `limit` catalog names at or above the threshold, best first.
    /// Equal scores are ordered by name.
    pub fn top_matches(&self, candidate: &str, limit: usize) -> Vec<ScoredName> {
        let mut scored: Vec<ScoredName> = self
            .catalog
            .normalized_universe()
            .filter_map(|name| {
                let score = self.scorer.score(candidate, name);
                (score >= self.threshold).then(|| ScoredName {
                    name: name.to_string(),
                    score,
                })
            })
            .collect();
        // Stable sort keeps the universe's lexicographic order within a score.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(limit);
        scored
    }

    fn expand(&self, candidate: &str, best: Option<&ScoredName>) -> Vec<MatchResult<'a>> {
        let Some(best) = best.filter(|b| b.score >= self.threshold) else {
            debug!(candidate, best = ?best, "no match above threshold");
            return Vec::new();
        };
        debug!(candidate, matched = %best.name, score = best.score, "matched");
        self.catalog
            .records_for_normalized_name(&best.name)
            .into_iter()
            .map(|record| MatchResult {
                candidate: candidate.to_string(),
                matched_name: best.name.clone(),
                score: best.score,
                record,
            })
            .collect()
    }
}

/// Match every candidate with the token-sort scorer.
pub fn match_all<'a, I>(
    candidates: I,
    catalog: &'a ReferenceCatalog,
    threshold: u8,
) -> Result<MatchSet<'a>, MatchError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let engine = MatchEngine::new(catalog, ScorerKind::TokenSort, threshold)?;
    Ok(engine.match_all(candidates))
}

/// The outcome of one matching run.
#[derive(Debug, Clone, Serialize)]
pub struct MatchSet<'a> {
    candidates: Vec<String>,
    results: Vec<MatchResult<'a>>,
}

/// Aggregate counts for a [`MatchSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub distinct_candidates: usize,
    pub matched_species: usize,
    pub total_matches: usize,
}

impl<'a> MatchSet<'a> {
    /// Candidates as supplied, duplicates included.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn results(&self) -> &[MatchResult<'a>] {
        &self.results
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn distinct_candidate_count(&self) -> usize {
        self.candidates.iter().collect::<HashSet<_>>().len()
    }

    pub fn distinct_species_count(&self) -> usize {
        self.results
            .iter()
            .map(|r| r.record.scientific_name.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Matched records deduplicated by scientific name; first occurrence wins.
    pub fn unique_records(&self) -> Vec<&'a SpeciesRecord> {
        let mut seen = HashSet::new();
        self.results
            .iter()
            .filter(|r| seen.insert(r.record.scientific_name.as_str()))
            .map(|r| r.record)
            .collect()
    }

    /// Distinct matched scientific names in first-seen order.
    pub fn matched_scientific_names(&self) -> Vec<&'a str> {
        self.unique_records()
            .into_iter()
            .map(|r| r.scientific_name.as_str())
            .collect()
    }

    pub fn summary(&self) -> MatchSummary {
        MatchSummary {
            distinct_candidates: self.distinct_candidate_count(),
            matched_species: self.distinct_species_count(),
            total_matches: self.results.len(),
        }
    }
}
