//! Delimited-file loader for the reference catalog.
//!
//! Reference lists are exported from spreadsheets as `;`-separated UTF-8,
//! often with a byte-order mark. Two configured columns become the record's
//! vernacular and scientific names; every other column is passed through.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::{info, warn};

use crate::catalog::ReferenceCatalog;
use crate::error::CatalogError;
use crate::record::SpeciesRecord;

/// Column layout of a catalog file.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    pub delimiter: u8,
    pub vernacular_column: String,
    pub scientific_column: String,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            vernacular_column: "FinnishName".into(),
            scientific_column: "ScientificName".into(),
        }
    }
}

/// Load and index a catalog file.
pub fn load_catalog_csv(path: &Path, opts: &CsvOptions) -> Result<ReferenceCatalog, CatalogError> {
    let file = File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let records = read_records(file, opts)?;
    info!(path = %path.display(), rows = records.len(), "loaded catalog file");
    Ok(ReferenceCatalog::build(records))
}

/// Parse catalog rows from any reader.
///
/// Rows with both names empty are skipped. Rows with one empty name are kept.
pub fn read_records<R: Read>(
    reader: R,
    opts: &CsvOptions,
) -> Result<Vec<SpeciesRecord>, CatalogError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(opts.delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| CatalogError::MissingColumn(name.to_string()))
    };
    let vernacular_idx = column(&opts.vernacular_column)?;
    let scientific_idx = column(&opts.scientific_column)?;

    let mut records = Vec::new();
    for (row, result) in rdr.records().enumerate() {
        let fields = result?;
        let vernacular = fields.get(vernacular_idx).unwrap_or_default();
        let scientific = fields.get(scientific_idx).unwrap_or_default();
        if vernacular.is_empty() && scientific.is_empty() {
            warn!(row = row + 1, "skipping catalog row with no names");
            continue;
        }

        let mut record = SpeciesRecord::new(vernacular, scientific);
        for (idx, value) in fields.iter().enumerate() {
            if idx == vernacular_idx || idx == scientific_idx || value.is_empty() {
                continue;
            }
            if let Some(header) = headers.get(idx) {
                record.extra.insert(header.clone(), value.to_string());
            }
        }
        records.push(record);
    }
    Ok(records)
}
