// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Fan-out/fan-in over the listing, detail and thumbnail endpoints.
//!
//! One listing call picks the games; detail and icon batches for those games
//! are then fetched concurrently and joined. Detail data is required, icons are
//! best-effort: any icon failure degrades to placeholder icons instead of
//! failing the request.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::{join_all, try_join_all, FutureExt};
use tokio::time::Instant;

use crate::coalesce::SingleFlight;
use crate::error::FetchError;
use crate::join;
use crate::metrics::Metrics;
use crate::model::{DetailRecord, GameSummary, ThumbnailRecord, UniverseId};
use crate::router::ListingRequest;
use crate::upstream::{call_with_policy, CallKind, GamesUpstream, RetryPolicy, UpstreamError};

/// Knobs for how upstream calls are issued.
#[derive(Debug, Clone, Copy)]
pub struct FetchSettings {
    /// Time budget for each individual upstream attempt.
    pub timeout: Duration,
    pub retry: RetryPolicy,
    /// Largest identifier batch sent in one detail or icon call.
    pub max_batch_size: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            retry: RetryPolicy::NONE,
            max_batch_size: 50,
        }
    }
}

pub type Games = Arc<Vec<GameSummary>>;

#[derive(Clone)]
pub struct GamesService {
    upstream: Arc<dyn GamesUpstream>,
    metrics: Metrics,
    settings: FetchSettings,
    flights: Option<SingleFlight<ListingRequest, Games, FetchError>>,
}

/// Icons gathered across all chunks of one batch.
struct IconFetch {
    records: Vec<ThumbnailRecord>,
    failed_chunks: usize,
    total_chunks: usize,
}

impl IconFetch {
    /// `None` when no chunk succeeded, i.e. the thumbnail set is absent.
    fn available(&self) -> Option<&[ThumbnailRecord]> {
        (self.failed_chunks < self.total_chunks).then_some(self.records.as_slice())
    }
}

impl GamesService {
    pub fn new(upstream: Arc<dyn GamesUpstream>, metrics: Metrics, settings: FetchSettings) -> Self {
        Self {
            upstream,
            metrics,
            settings: FetchSettings {
                max_batch_size: settings.max_batch_size.max(1),
                ..settings
            },
            flights: None,
        }
    }

    /// Share one fan-out between identical concurrent queries.
    pub fn with_coalescing(mut self) -> Self {
        self.flights = Some(SingleFlight::new());
        self
    }

    /// Resolve a routed listing request into joined game summaries.
    pub async fn games(&self, request: ListingRequest) -> Result<Games, FetchError> {
        let Some(flights) = &self.flights else {
            return self.fetch(&request).await.map(Arc::new);
        };

        let service = self.clone();
        let key = request.clone();
        let outcome = flights
            .run(key, move || {
                async move { service.fetch(&request).await.map(Arc::new) }.boxed()
            })
            .await;

        if outcome.joined {
            self.metrics.record_coalesced_request();
        }

        outcome.result
    }

    // The time budget is per call. Details wait on the listing, so a request
    // can take up to two budgets before it answers.
    async fn fetch(&self, request: &ListingRequest) -> Result<Vec<GameSummary>, FetchError> {
        let listing = self
            .call(CallKind::Listing, || self.upstream.list_games(request))
            .await
            .map_err(|error| FetchError::new(CallKind::Listing, error))?;

        let ids = join::ranked_ids(&listing.into_records());
        if ids.is_empty() {
            tracing::debug!(%request, "listing returned no games");
            return Ok(Vec::new());
        }

        // Icons never fail the request, so a detail failure returns early
        // without waiting for them.
        let (details, icons) = tokio::try_join!(
            self.fetch_details(&ids),
            self.fetch_icons(&ids).map(Ok::<_, FetchError>),
        )?;

        let details = join::order_details(details, &ids);
        let outcome = join::join(&details, icons.available());

        if icons.failed_chunks > 0 {
            self.metrics.record_degraded_response();
            tracing::warn!(
                %request,
                failed_chunks = icons.failed_chunks,
                total_chunks = icons.total_chunks,
                placeholder_icons = outcome.placeholder_icons,
                "serving games with placeholder icons"
            );
        }

        tracing::debug!(%request, games = outcome.games.len(), "joined catalog response");

        Ok(outcome.games)
    }

    async fn fetch_details(&self, ids: &[UniverseId]) -> Result<Vec<DetailRecord>, FetchError> {
        let chunks = ids.chunks(self.settings.max_batch_size).map(|chunk| {
            self.call(CallKind::Details, move || self.upstream.game_details(chunk))
        });

        let batches = try_join_all(chunks)
            .await
            .map_err(|error| FetchError::new(CallKind::Details, error))?;

        Ok(batches.into_iter().flatten().collect())
    }

    async fn fetch_icons(&self, ids: &[UniverseId]) -> IconFetch {
        let chunks = ids.chunks(self.settings.max_batch_size).map(|chunk| {
            self.call(CallKind::Thumbnails, move || self.upstream.game_icons(chunk))
        });

        let results = join_all(chunks).await;
        let total_chunks = results.len();
        let mut failed_chunks = 0;
        let mut records = Vec::new();

        for result in results {
            match result {
                Ok(batch) => records.extend(batch),
                Err(_) => failed_chunks += 1,
            }
        }

        IconFetch {
            records,
            failed_chunks,
            total_chunks,
        }
    }

    async fn call<T, F, Fut>(&self, kind: CallKind, call: F) -> Result<T, UpstreamError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, UpstreamError>>,
    {
        self.metrics.record_upstream_request(kind);
        let start = Instant::now();

        let result = call_with_policy(kind, self.settings.timeout, self.settings.retry, call).await;

        self.metrics
            .record_upstream_latency(kind, start.elapsed().as_secs_f64());

        if let Err(error) = &result {
            self.metrics.record_upstream_failure(kind);
            tracing::warn!(call = %kind, %error, "upstream call failed");
        }

        result
    }
}
