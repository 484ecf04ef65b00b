//! Occurrence layer: bounded, fault-tolerant pagination over the GBIF
//! occurrence search API.

mod error;
pub mod fetcher;

#[cfg(feature = "http")]
pub mod http;

pub use error::FetchError;
pub use fetcher::{
    DEFAULT_MAX_RECORDS, FetchSession, FetchState, OccurrenceFetch, OccurrenceFetcher,
    OccurrencePage, OccurrencePoint, OccurrenceRecord, OccurrenceSource, PAGE_SIZE, PageRequest,
    StopReason, fetch_occurrences,
};

#[cfg(feature = "http")]
pub use http::{GbifClient, GbifConfig};
