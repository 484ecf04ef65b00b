//! Species identity resolution: reference catalog, pasted-list
//! normalisation, and fuzzy matching.

pub mod catalog;
mod error;
pub mod input;
pub mod loader;
pub mod matching;
pub mod normalize;
pub mod record;
pub mod similarity;

pub use catalog::{CatalogSummary, ReferenceCatalog, build_catalog};
pub use error::{CatalogError, MatchError};
pub use input::{Candidate, candidates, normalize_input};
pub use loader::{CsvOptions, load_catalog_csv, read_records};
pub use matching::{
    DEFAULT_LOOKUP_LIMIT, DEFAULT_THRESHOLD, MatchEngine, MatchResult, MatchSet, MatchSummary,
    ScoredName, match_all,
};
pub use normalize::normalize_name;
pub use record::SpeciesRecord;
pub use similarity::{Scorer, ScorerKind, TokenSortJaroWinkler, TokenSortRatio};
