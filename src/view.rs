//! Loading state for the list and detail views.
//!
//! Every fetch a view starts is stamped with the next value of a per-view
//! sequence. Completions carrying an older stamp are dropped, so a slow
//! response can never overwrite the result of a request issued after it.
//!
//! The guard matters for views that outlive a single request, where a client
//! drives `begin_*` and `complete` as responses arrive. The async `load_*`
//! and `search` helpers run one fetch to completion under `&mut self` and
//! never overlap with another fetch on the same view.

use serde::Serialize;
use tracing::{debug, warn};

use crate::catalog::CatalogApi;
use crate::error::CatalogError;
use crate::models::{MovieDetail, MovieId, MovieSummary};

pub const POPULAR_FAILED: &str = "Failed to load movies...";
pub const SEARCH_FAILED: &str = "Failed to search movies...";
pub const MOVIE_NOT_FOUND: &str = "Movie not found";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "data", rename_all = "snake_case")]
pub enum ViewState<T> {
    Idle,
    Loading,
    Loaded(T),
    Errored(String),
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        ViewState::Idle
    }
}

impl<T> ViewState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, ViewState::Loading)
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            ViewState::Loaded(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ViewState<U> {
        match self {
            ViewState::Idle => ViewState::Idle,
            ViewState::Loading => ViewState::Loading,
            ViewState::Loaded(v) => ViewState::Loaded(f(v)),
            ViewState::Errored(msg) => ViewState::Errored(msg),
        }
    }
}

/// Stamp handed out when a view starts a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    kind: FetchKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Popular,
    Search,
    Detail,
}

#[derive(Debug, Default)]
struct RequestSeq {
    latest: u64,
}

impl RequestSeq {
    fn issue(&mut self, kind: FetchKind) -> Ticket {
        self.latest += 1;
        Ticket {
            seq: self.latest,
            kind,
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.seq == self.latest
    }
}

/// The home grid: popular movies or the last search result set.
#[derive(Debug, Default)]
pub struct MovieListView {
    state: ViewState<Vec<MovieSummary>>,
    seq: RequestSeq,
    last_query: Option<String>,
}

impl MovieListView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ViewState<Vec<MovieSummary>> {
        &self.state
    }

    pub fn into_state(self) -> ViewState<Vec<MovieSummary>> {
        self.state
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    pub fn begin_popular(&mut self) -> Ticket {
        self.state = ViewState::Loading;
        self.seq.issue(FetchKind::Popular)
    }

    /// Blank queries are rejected here: no ticket, no state change.
    pub fn begin_search(&mut self, query: &str) -> Option<Ticket> {
        if query.trim().is_empty() {
            debug!("Ignoring blank search");
            return None;
        }
        self.last_query = Some(query.to_string());
        self.state = ViewState::Loading;
        Some(self.seq.issue(FetchKind::Search))
    }

    /// Applies a finished fetch. Returns false when `ticket` was superseded.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<Vec<MovieSummary>, CatalogError>,
    ) -> bool {
        if !self.seq.is_current(&ticket) {
            debug!(seq = ticket.seq, "Dropping stale list response");
            return false;
        }
        self.state = match result {
            Ok(movies) => ViewState::Loaded(movies),
            Err(e) => {
                warn!("List fetch failed: {}", e);
                let message = match ticket.kind {
                    FetchKind::Search => SEARCH_FAILED,
                    _ => POPULAR_FAILED,
                };
                ViewState::Errored(message.to_string())
            }
        };
        true
    }

    /// Begins and completes one popular fetch.
    pub async fn load_popular(&mut self, catalog: &dyn CatalogApi) {
        let ticket = self.begin_popular();
        let result = catalog.fetch_popular().await;
        self.complete(ticket, result);
    }

    /// Returns false when the query was rejected before any request.
    pub async fn search(&mut self, catalog: &dyn CatalogApi, query: &str) -> bool {
        let Some(ticket) = self.begin_search(query) else {
            return false;
        };
        let result = catalog.search(query).await;
        self.complete(ticket, result);
        true
    }
}

#[derive(Debug, Default)]
pub struct MovieDetailView {
    id: Option<MovieId>,
    state: ViewState<MovieDetail>,
    seq: RequestSeq,
}

impl MovieDetailView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<MovieId> {
        self.id
    }

    pub fn state(&self) -> &ViewState<MovieDetail> {
        &self.state
    }

    pub fn into_state(self) -> ViewState<MovieDetail> {
        self.state
    }

    pub fn begin(&mut self, id: MovieId) -> Ticket {
        self.id = Some(id);
        self.state = ViewState::Loading;
        self.seq.issue(FetchKind::Detail)
    }

    pub fn complete(&mut self, ticket: Ticket, detail: Option<MovieDetail>) -> bool {
        if !self.seq.is_current(&ticket) {
            debug!(seq = ticket.seq, "Dropping stale detail response");
            return false;
        }
        self.state = match detail {
            Some(d) => ViewState::Loaded(d),
            None => ViewState::Errored(MOVIE_NOT_FOUND.to_string()),
        };
        true
    }

    pub async fn load(&mut self, catalog: &dyn CatalogApi, id: MovieId) {
        let ticket = self.begin(id);
        let detail = catalog.fetch_details(id).await;
        self.complete(ticket, detail);
    }
}
