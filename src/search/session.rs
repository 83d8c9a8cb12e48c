use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{
    UnboundedReceiver, UnboundedSender, error::TryRecvError, unbounded_channel,
};
use tokio::task::{JoinError, JoinHandle};
use tokio::time;
use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::directory::{Catalog, Location, filter_by_text};
use crate::error::{AppError, AppResult};
use crate::geo::{Coordinates, distance_meters};

use super::provider::{GeocodeResponse, Geocoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    #[default]
    Idle,
    Searching,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    Completed {
        generation: u64,
        results: Vec<Location>,
    },
    Failed {
        generation: u64,
        message: String,
    },
}

impl SearchEvent {
    fn generation(&self) -> u64 {
        match self {
            Self::Completed { generation, .. } | Self::Failed { generation, .. } => *generation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub result_limit: usize,
    pub debounce: Duration,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

impl SearchOptions {
    pub fn from_config(config: &SearchConfig) -> Self {
        Self {
            result_limit: config.result_limit.max(1),
            debounce: config.debounce(),
        }
    }
}

/// Search box state: catalog matches merged with live geocoding results.
///
/// Every submit bumps the generation. Only events tagged with the current
/// generation may replace `results`, so a slow answer to an old query never
/// overwrites a newer one.
pub struct SearchSession {
    catalog: Arc<Catalog>,
    geocoder: Arc<dyn Geocoder>,
    options: SearchOptions,
    query: String,
    proximity_anchor: Option<Coordinates>,
    results: Arc<[Location]>,
    status: SearchStatus,
    generation: u64,
    event_tx: UnboundedSender<SearchEvent>,
    event_rx: UnboundedReceiver<SearchEvent>,
    in_flight: Option<JoinHandle<()>>,
}

impl SearchSession {
    pub fn new(catalog: Arc<Catalog>, geocoder: Arc<dyn Geocoder>, options: SearchOptions) -> Self {
        let (event_tx, event_rx) = unbounded_channel();
        Self {
            catalog,
            geocoder,
            options,
            query: String::new(),
            proximity_anchor: None,
            results: Arc::from(Vec::new()),
            status: SearchStatus::Idle,
            generation: 0,
            event_tx,
            event_rx,
            in_flight: None,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn proximity_anchor(&self) -> Option<Coordinates> {
        self.proximity_anchor
    }

    pub fn results(&self) -> Arc<[Location]> {
        Arc::clone(&self.results)
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Starts a search and returns its generation.
    ///
    /// A blank query clears the results immediately and issues no lookup.
    /// Must be called from within a tokio runtime.
    pub fn submit(&mut self, query: &str, proximity_anchor: Coordinates) -> AppResult<u64> {
        let trimmed = query.trim();
        let handle = if trimmed.is_empty() {
            None
        } else {
            Some(
                Handle::try_current()
                    .map_err(|_| AppError::unsupported("search requires a tokio runtime"))?,
            )
        };

        self.generation = self.generation.saturating_add(1);
        self.abort_in_flight();
        self.query = query.to_string();
        self.proximity_anchor = Some(proximity_anchor);

        let Some(handle) = handle else {
            self.results = Arc::from(Vec::new());
            self.status = SearchStatus::Idle;
            debug!(generation = self.generation, "search cleared");
            return Ok(self.generation);
        };

        let job = SearchJob {
            generation: self.generation,
            query: trimmed.to_string(),
            anchor: proximity_anchor,
            catalog_matches: filter_by_text(self.catalog.locations(), trimmed),
            geocoder: Arc::clone(&self.geocoder),
            options: self.options,
        };
        let event_tx = self.event_tx.clone();
        self.in_flight = Some(handle.spawn(async move {
            let event = job.run().await;
            let _ = event_tx.send(event);
        }));

        self.status = SearchStatus::Searching;
        debug!(generation = self.generation, query = trimmed, "search issued");
        Ok(self.generation)
    }

    /// Applies finished searches. Returns true when visible state changed.
    pub fn drain_events(&mut self) -> bool {
        let mut changed = false;
        loop {
            match self.event_rx.try_recv() {
                Ok(event) => changed |= self.apply(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        changed
    }

    pub async fn search(
        &mut self,
        query: &str,
        proximity_anchor: Coordinates,
    ) -> AppResult<Arc<[Location]>> {
        let generation = self.submit(query, proximity_anchor)?;
        while self.generation == generation && self.status == SearchStatus::Searching {
            let waited = match self.in_flight.as_mut() {
                Some(task) => tokio::select! {
                    biased;
                    event = self.event_rx.recv() => Waited::Event(event),
                    joined = task => Waited::TaskEnded(joined),
                },
                None => Waited::Event(self.event_rx.recv().await),
            };

            match waited {
                Waited::Event(Some(event)) => {
                    self.apply(event);
                }
                Waited::Event(None) => break,
                // Its event, if any, is already queued.
                Waited::TaskEnded(Ok(())) => self.in_flight = None,
                Waited::TaskEnded(Err(err)) => {
                    self.in_flight = None;
                    self.apply(SearchEvent::Failed {
                        generation,
                        message: format!("search task ended early: {err}"),
                    });
                }
            }
        }
        Ok(self.results())
    }

    fn apply(&mut self, event: SearchEvent) -> bool {
        if event.generation() != self.generation {
            debug!(
                stale = event.generation(),
                current = self.generation,
                "discarding stale search result"
            );
            return false;
        }

        match event {
            SearchEvent::Completed { results, .. } => {
                debug!(
                    generation = self.generation,
                    count = results.len(),
                    "search results applied"
                );
                self.results = Arc::from(results);
                self.status = SearchStatus::Done;
            }
            SearchEvent::Failed { message, .. } => {
                warn!(generation = self.generation, %message, "search failed");
                self.results = Arc::from(Vec::new());
                self.status = SearchStatus::Failed;
            }
        }
        self.in_flight = None;
        true
    }

    fn abort_in_flight(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

impl Drop for SearchSession {
    fn drop(&mut self) {
        self.abort_in_flight();
    }
}

enum Waited {
    Event(Option<SearchEvent>),
    TaskEnded(Result<(), JoinError>),
}

struct SearchJob {
    generation: u64,
    query: String,
    anchor: Coordinates,
    catalog_matches: Vec<Location>,
    geocoder: Arc<dyn Geocoder>,
    options: SearchOptions,
}

impl SearchJob {
    async fn run(self) -> SearchEvent {
        // A newer submit aborts this task while it sleeps, which is the debounce.
        if !self.options.debounce.is_zero() {
            time::sleep(self.options.debounce).await;
        }

        match self
            .geocoder
            .geocode(&self.query, self.anchor, self.options.result_limit)
            .await
        {
            Ok(response) => SearchEvent::Completed {
                generation: self.generation,
                results: merge_results(
                    self.catalog_matches,
                    response,
                    self.anchor,
                    self.options.result_limit,
                ),
            },
            Err(err) => SearchEvent::Failed {
                generation: self.generation,
                message: err.to_string(),
            },
        }
    }
}

/// Catalog matches first, then geocoded hits nearest the anchor first.
fn merge_results(
    catalog_matches: Vec<Location>,
    response: GeocodeResponse,
    anchor: Coordinates,
    limit: usize,
) -> Vec<Location> {
    let mut geocoded: Vec<(f64, Location)> = response
        .results
        .into_iter()
        .filter(|result| result.center.iter().all(|v| v.is_finite()))
        .map(|result| {
            let coordinates = Coordinates::from_lon_lat(result.center);
            let location = Location::geocoded(&result.id, &result.display_name, coordinates);
            (distance_meters(anchor, coordinates), location)
        })
        .collect();
    geocoded.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut seen: HashSet<_> = catalog_matches.iter().map(|l| l.id.clone()).collect();
    let mut merged = catalog_matches;
    merged.extend(
        geocoded
            .into_iter()
            .map(|(_, location)| location)
            .filter(|location| seen.insert(location.id.clone()))
            .take(limit),
    );
    merged
}
