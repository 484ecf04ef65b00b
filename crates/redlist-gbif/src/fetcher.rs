//! Paginated occurrence retrieval as an explicit state machine.
//!
//! A session starts in `Fetching { offset: 0 }` and issues one page request
//! per step until it reaches `Done`. Every way of stopping is a
//! [`StopReason`]; an upstream failure ends pagination with the points
//! gathered so far instead of surfacing as an error.
//!
//! # Bounds
//!
//! - Page size is fixed at [`PAGE_SIZE`], the API maximum
//! - At most `ceil(max_records / PAGE_SIZE)` requests are issued
//! - At most `max_records` points are returned
//! - No retries: a failed page is the last page

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::FetchError;

/// Records per page. The occurrence API rejects larger limits.
pub const PAGE_SIZE: usize = 300;

/// Default cap on points returned per species.
pub const DEFAULT_MAX_RECORDS: usize = 1000;

/// A geocoded observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OccurrencePoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// One page of the occurrence search response. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OccurrencePage {
    #[serde(default)]
    pub results: Vec<OccurrenceRecord>,
}

/// An occurrence record; only the coordinates are read.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceRecord {
    pub decimal_latitude: Option<f64>,
    pub decimal_longitude: Option<f64>,
}

impl OccurrenceRecord {
    pub fn point(&self) -> Option<OccurrencePoint> {
        Some(OccurrencePoint {
            latitude: self.decimal_latitude?,
            longitude: self.decimal_longitude?,
        })
    }
}

/// Query for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<'a> {
    pub scientific_name: &'a str,
    pub limit: usize,
    pub offset: usize,
    pub has_coordinate: bool,
}

/// A paginated occurrence search endpoint.
#[async_trait]
pub trait OccurrenceSource: Send + Sync {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<OccurrencePage, FetchError>;
}

#[async_trait]
impl<T: OccurrenceSource + ?Sized> OccurrenceSource for &T {
    async fn fetch_page(&self, request: &PageRequest<'_>) -> Result<OccurrencePage, FetchError> {
        (**self).fetch_page(request).await
    }
}

/// Why a session stopped.
#[derive(Debug)]
pub enum StopReason {
    /// A page came back with no results.
    Exhausted,
    /// A page came back shorter than [`PAGE_SIZE`].
    LastPage,
    /// The next offset would reach the record cap.
    CapReached,
    /// The caller stopped stepping before the session was done.
    Abandoned,
    /// The request for the page at `offset` failed.
    Upstream { offset: usize, error: FetchError },
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exhausted => "exhausted",
            Self::LastPage => "last_page",
            Self::CapReached => "cap_reached",
            Self::Abandoned => "abandoned",
            Self::Upstream { .. } => "upstream_error",
        }
    }

    pub fn is_upstream_failure(&self) -> bool {
        matches!(self, Self::Upstream { .. })
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upstream { offset, error } => {
                write!(f, "upstream error at offset {offset}: {error}")
            }
            other => f.write_str(other.as_str()),
        }
    }
}

#[derive(Debug)]
pub enum FetchState {
    Fetching { offset: usize },
    Done(StopReason),
}

/// Step-wise pagination for one scientific name.
///
/// Dropping a session between steps is always safe; [`points`](Self::points)
/// is a valid partial result at every page boundary.
pub struct FetchSession<'s, S: ?Sized> {
    source: &'s S,
    scientific_name: String,
    max_records: usize,
    state: FetchState,
    points: Vec<OccurrencePoint>,
    requests: usize,
}

impl<'s, S: OccurrenceSource + ?Sized> FetchSession<'s, S> {
    pub fn new(source: &'s S, scientific_name: impl Into<String>, max_records: usize) -> Self {
        let state = if max_records == 0 {
            FetchState::Done(StopReason::CapReached)
        } else {
            FetchState::Fetching { offset: 0 }
        };
        Self {
            source,
            scientific_name: scientific_name.into(),
            max_records,
            state,
            points: Vec::new(),
            requests: 0,
        }
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, FetchState::Done(_))
    }

    pub fn points(&self) -> &[OccurrencePoint] {
        &self.points
    }

    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Fetch one page and advance. A no-op once `Done`.
    pub async fn step(&mut self) -> &FetchState {
        let FetchState::Fetching { offset } = self.state else {
            return &self.state;
        };

        let request = PageRequest {
            scientific_name: &self.scientific_name,
            limit: PAGE_SIZE,
            offset,
            has_coordinate: true,
        };
        self.requests += 1;

        let page = match self.source.fetch_page(&request).await {
            Ok(page) => page,
            Err(error) => {
                warn!(
                    scientific_name = %self.scientific_name,
                    offset,
                    error = %error,
                    "occurrence page failed, keeping partial result"
                );
                self.state = FetchState::Done(StopReason::Upstream { offset, error });
                return &self.state;
            }
        };

        let returned = page.results.len();
        if returned == 0 {
            self.state = FetchState::Done(StopReason::Exhausted);
            return &self.state;
        }

        let room = self.max_records - self.points.len();
        let before = self.points.len();
        self.points
            .extend(page.results.iter().filter_map(OccurrenceRecord::point).take(room));
        debug!(
            scientific_name = %self.scientific_name,
            offset,
            returned,
            kept = self.points.len() - before,
            "fetched occurrence page"
        );

        let next = offset + PAGE_SIZE;
        self.state = if returned < PAGE_SIZE {
            FetchState::Done(StopReason::LastPage)
        } else if next >= self.max_records {
            FetchState::Done(StopReason::CapReached)
        } else {
            FetchState::Fetching { offset: next }
        };
        &self.state
    }

    /// Step until `Done`.
    pub async fn run(&mut self) {
        while !self.is_done() {
            self.step().await;
        }
    }

    pub fn into_points(self) -> Vec<OccurrencePoint> {
        self.points
    }

    /// Finish into a report. A session abandoned before `Done` reports
    /// [`StopReason::Abandoned`].
    pub fn into_fetch(self) -> OccurrenceFetch {
        let stop = match self.state {
            FetchState::Done(reason) => reason,
            FetchState::Fetching { .. } => StopReason::Abandoned,
        };
        OccurrenceFetch {
            scientific_name: self.scientific_name,
            points: self.points,
            requests: self.requests,
            stop,
            fetched_at: Utc::now(),
        }
    }
}

/// Result of a completed fetch for one species.
#[derive(Debug)]
pub struct OccurrenceFetch {
    pub scientific_name: String,
    pub points: Vec<OccurrencePoint>,
    pub requests: usize,
    pub stop: StopReason,
    pub fetched_at: DateTime<Utc>,
}

impl OccurrenceFetch {
    /// `false` when the upstream stopped answering before the data ran out,
    /// or the session was abandoned.
    pub fn is_complete(&self) -> bool {
        !self.stop.is_upstream_failure() && !matches!(self.stop, StopReason::Abandoned)
    }
}

/// Fetches occurrences for scientific names from one source.
pub struct OccurrenceFetcher<S> {
    source: S,
    max_records: usize,
}

impl<S: OccurrenceSource> OccurrenceFetcher<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_records: DEFAULT_MAX_RECORDS,
        }
    }

    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    pub fn max_records(&self) -> usize {
        self.max_records
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn session(&self, scientific_name: &str) -> FetchSession<'_, S> {
        FetchSession::new(&self.source, scientific_name, self.max_records)
    }

    /// Paginate to completion for one name.
    pub async fn fetch(&self, scientific_name: &str) -> OccurrenceFetch {
        let mut session = self.session(scientific_name);
        session.run().await;
        let fetch = session.into_fetch();
        info!(
            scientific_name,
            points = fetch.points.len(),
            requests = fetch.requests,
            stop = fetch.stop.as_str(),
            "occurrence fetch done"
        );
        fetch
    }

    /// Fetch several names with up to `concurrency` sessions in flight.
    /// Each session paginates sequentially; results keep input order.
    pub async fn fetch_many<I>(
        &self,
        scientific_names: I,
        concurrency: usize,
    ) -> Vec<OccurrenceFetch>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let names: Vec<String> = scientific_names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .collect();
        stream::iter(names.iter())
            .map(|name| self.fetch(name))
            .buffered(concurrency.max(1))
            .collect()
            .await
    }
}

/// Up to `max_records` geocoded points for `scientific_name`.
pub async fn fetch_occurrences<S: OccurrenceSource + ?Sized>(
    source: &S,
    scientific_name: &str,
    max_records: usize,
) -> Vec<OccurrencePoint> {
    let mut session = FetchSession::new(source, scientific_name, max_records);
    session.run().await;
    session.into_points()
}
