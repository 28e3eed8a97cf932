// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Freshness policy attached to successful responses.
//!
//! Nothing is cached in-process. Shared caches between the client and the
//! proxy are told how long a representation stays fresh and that a stale copy
//! may be served while they revalidate in the background.

use std::time::Duration;

use axum::http::header;
use axum::response::{IntoResponse, Response};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// `s-maxage` for shared caches.
    pub shared_max_age: Duration,
    /// Bounded `stale-while-revalidate` window. `None` emits the bare directive.
    pub stale_while_revalidate: Option<Duration>,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            shared_max_age: Duration::from_secs(300),
            stale_while_revalidate: None,
        }
    }
}

impl CachePolicy {
    /// `Cache-Control` directive, e.g. `s-maxage=300, stale-while-revalidate`.
    pub fn directive(&self) -> String {
        let max_age = self.shared_max_age.as_secs();
        match self.stale_while_revalidate {
            Some(window) => format!(
                "s-maxage={max_age}, stale-while-revalidate={}",
                window.as_secs()
            ),
            None => format!("s-maxage={max_age}, stale-while-revalidate"),
        }
    }

    /// Attach the directive to a successful response body.
    pub fn annotate(&self, body: impl IntoResponse) -> Response {
        ([(header::CACHE_CONTROL, self.directive())], body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::*;

    #[test]
    fn default_directive_matches_edge_contract() {
        assert_eq!(
            CachePolicy::default().directive(),
            "s-maxage=300, stale-while-revalidate"
        );
    }

    #[test]
    fn bounded_revalidation_window_is_rendered() {
        let policy = CachePolicy {
            shared_max_age: Duration::from_secs(60),
            stale_while_revalidate: Some(Duration::from_secs(600)),
        };
        assert_eq!(policy.directive(), "s-maxage=60, stale-while-revalidate=600");
    }

    #[test]
    fn annotate_sets_cache_control_header() {
        let response = CachePolicy::default().annotate("[]");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "s-maxage=300, stale-while-revalidate"
        );
    }
}
