// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Upstream clients for the games and thumbnails APIs.
//!
//! [`GamesUpstream`] is the seam the proxy talks through; [`HttpUpstream`] is
//! the reqwest-backed implementation used in production. Every call resolves
//! to either a decoded payload or a classified [`UpstreamError`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::UpstreamConfig;
use crate::model::{DataEnvelope, DetailRecord, ListingPage, ThumbnailRecord, UniverseId};
use crate::router::ListingRequest;

const ICON_PARAMS: &str = "size=256x256&format=Png&isCircular=false";

/// Failure of a single upstream call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("upstream unreachable: {0}")]
    Unavailable(String),
    #[error("upstream call exceeded its time budget")]
    Timeout,
    #[error("upstream returned status {0}")]
    Http(u16),
    #[error("upstream returned a malformed body: {0}")]
    Malformed(String),
}

impl UpstreamError {
    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Malformed(error.to_string())
        } else {
            Self::Unavailable(error.to_string())
        }
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout | Self::Unavailable(_) => true,
            Self::Http(status) => *status >= 500,
            Self::Malformed(_) => false,
        }
    }
}

/// The three upstream calls a request can make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Listing,
    Details,
    Thumbnails,
}

impl CallKind {
    pub fn as_str(self) -> &'static str {
        match self {
            CallKind::Listing => "listing",
            CallKind::Details => "details",
            CallKind::Thumbnails => "thumbnails",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Access to the listing, detail and thumbnail endpoints.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GamesUpstream: Send + Sync {
    async fn list_games(&self, request: &ListingRequest) -> Result<ListingPage, UpstreamError>;

    async fn game_details(&self, ids: &[UniverseId]) -> Result<Vec<DetailRecord>, UpstreamError>;

    async fn game_icons(&self, ids: &[UniverseId]) -> Result<Vec<ThumbnailRecord>, UpstreamError>;
}

/// reqwest-backed client. Cloning shares the underlying connection pool.
#[derive(Clone)]
pub struct HttpUpstream {
    games_base_url: String,
    thumbnails_base_url: String,
    client: Client,
}

impl HttpUpstream {
    pub fn try_new(config: &UpstreamConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build upstream client: {}", e))?;

        Ok(Self {
            games_base_url: config.games_base_url.trim_end_matches('/').to_string(),
            thumbnails_base_url: config.thumbnails_base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(UpstreamError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Http(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(UpstreamError::from_transport)?;

        serde_json::from_slice(&body).map_err(|e| UpstreamError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl GamesUpstream for HttpUpstream {
    async fn list_games(&self, request: &ListingRequest) -> Result<ListingPage, UpstreamError> {
        let url = format!("{}{}", self.games_base_url, request.path_and_query());
        self.get_json(&url).await
    }

    async fn game_details(&self, ids: &[UniverseId]) -> Result<Vec<DetailRecord>, UpstreamError> {
        let url = format!("{}/v1/games?universeIds={}", self.games_base_url, join_ids(ids));
        let envelope: DataEnvelope<DetailRecord> = self.get_json(&url).await?;
        Ok(envelope.data)
    }

    async fn game_icons(&self, ids: &[UniverseId]) -> Result<Vec<ThumbnailRecord>, UpstreamError> {
        let url = format!(
            "{}/v1/games/icons?universeIds={}&{ICON_PARAMS}",
            self.thumbnails_base_url,
            join_ids(ids)
        );
        let envelope: DataEnvelope<ThumbnailRecord> = self.get_json(&url).await?;
        Ok(envelope.data)
    }
}

/// Comma-separated identifier batch, e.g. `1,2,3`.
pub fn join_ids(ids: &[UniverseId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Bounded retry with exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub const NONE: RetryPolicy = RetryPolicy {
        max_retries: 0,
        backoff: Duration::ZERO,
    };

    fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << attempt.min(16))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::NONE
    }
}

/// Run one upstream call under its time budget, retrying transient failures.
///
/// Each attempt gets the full `budget`. An attempt that overruns is dropped and
/// counts as [`UpstreamError::Timeout`]; nothing outside this call is cancelled.
pub async fn call_with_policy<T, F, Fut>(
    kind: CallKind,
    budget: Duration,
    retry: RetryPolicy,
    mut call: F,
) -> Result<T, UpstreamError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let mut attempt = 0;
    loop {
        let outcome = match tokio::time::timeout(budget, call()).await {
            Ok(result) => result,
            Err(_) => Err(UpstreamError::Timeout),
        };

        match outcome {
            Err(error) if error.is_retryable() && attempt < retry.max_retries => {
                let delay = retry.delay_for(attempt);
                tracing::debug!(
                    call = kind.as_str(),
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    %error,
                    "retrying upstream call"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}
