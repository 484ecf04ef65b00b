//! Terminal and JSON rendering of match and occurrence results.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use redlist_core::{MatchSet, MatchSummary, ScoredName, SpeciesRecord};
use redlist_gbif::{OccurrenceFetch, OccurrencePoint};
use serde::Serialize;

const MAX_EXTRA_COLUMNS: usize = 4;

// ── Text ──

pub fn print_summary(out: &mut impl Write, summary: &MatchSummary) -> io::Result<()> {
    writeln!(out, "Summary")?;
    writeln!(
        out,
        "  {:<44} {}",
        "Total unique species in input data:", summary.distinct_candidates
    )?;
    writeln!(
        out,
        "  {:<44} {}",
        "Total species matched in catalog:", summary.matched_species
    )?;
    writeln!(out)
}

/// Match list (one line per result) followed by the deduplicated record table.
pub fn print_matches(out: &mut impl Write, set: &MatchSet<'_>) -> io::Result<()> {
    if set.is_empty() {
        return writeln!(out, "No endangered species found.");
    }

    writeln!(out, "Found {} endangered species matches:", set.results().len())?;
    for r in set.results() {
        writeln!(
            out,
            "  Input: {:<28} -> Matched: {} (score {})",
            r.candidate, r.matched_name, r.score
        )?;
    }
    writeln!(out)?;

    let records = set.unique_records();
    writeln!(out, "Matched species ({}):", records.len())?;
    for record in records {
        print_record(out, record)?;
    }
    writeln!(out)
}

pub fn print_lookup(
    out: &mut impl Write,
    query: &str,
    hits: &[(ScoredName, Vec<&SpeciesRecord>)],
) -> io::Result<()> {
    if hits.is_empty() {
        return writeln!(out, "No matches for '{query}'.");
    }
    writeln!(out, "Matches found:")?;
    for (scored, records) in hits {
        writeln!(out, "- {} (Score: {})", scored.name, scored.score)?;
        for record in records {
            writeln!(out, "  Scientific Name: {}", record.scientific_name)?;
        }
    }
    Ok(())
}

pub fn print_occurrences(out: &mut impl Write, fetches: &[OccurrenceFetch]) -> io::Result<()> {
    writeln!(out, "Occurrences")?;
    for fetch in fetches {
        write!(
            out,
            "  {:<32} {:>5} points",
            fetch.scientific_name,
            fetch.points.len()
        )?;
        if !fetch.is_complete() {
            write!(out, "  (partial: {})", fetch.stop)?;
        }
        writeln!(out)?;
    }
    writeln!(out)
}

fn print_record(out: &mut impl Write, record: &SpeciesRecord) -> io::Result<()> {
    write!(
        out,
        "  {:<32} {:<24}",
        record.scientific_name, record.vernacular_name
    )?;
    let extras: Vec<String> = record
        .extra
        .iter()
        .take(MAX_EXTRA_COLUMNS)
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    if !extras.is_empty() {
        write!(out, " {}", extras.join("  "))?;
    }
    if record.extra.len() > MAX_EXTRA_COLUMNS {
        write!(out, "  ... and {} more", record.extra.len() - MAX_EXTRA_COLUMNS)?;
    }
    writeln!(out)
}

// ── JSON ──

#[derive(Serialize)]
pub struct Report<'a> {
    pub summary: MatchSummary,
    pub matches: &'a MatchSet<'a>,
    pub species: Vec<&'a SpeciesRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub occurrences: Vec<OccurrenceReport<'a>>,
}

#[derive(Serialize)]
pub struct OccurrenceReport<'a> {
    pub scientific_name: &'a str,
    pub requests: usize,
    pub stop: String,
    pub complete: bool,
    pub fetched_at: DateTime<Utc>,
    pub points: &'a [OccurrencePoint],
}

impl<'a> Report<'a> {
    pub fn new(set: &'a MatchSet<'a>, fetches: &'a [OccurrenceFetch]) -> Self {
        Self {
            summary: set.summary(),
            matches: set,
            species: set.unique_records(),
            occurrences: fetches.iter().map(OccurrenceReport::from).collect(),
        }
    }
}

impl<'a> From<&'a OccurrenceFetch> for OccurrenceReport<'a> {
    fn from(fetch: &'a OccurrenceFetch) -> Self {
        Self {
            scientific_name: &fetch.scientific_name,
            requests: fetch.requests,
            stop: fetch.stop.to_string(),
            complete: fetch.is_complete(),
            fetched_at: fetch.fetched_at,
            points: &fetch.points,
        }
    }
}
