// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Prometheus metrics for the catalog proxy.
//!
//! Tracks client requests, upstream call volume and latency per call kind,
//! and how often responses were served with degraded icons.

use std::sync::Arc;

use anyhow::Context;
use prometheus::core::Collector;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry};

use crate::error::AppError;
use crate::upstream::CallKind;

/// Metrics collector. Cloning shares the underlying registry.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,

    // Client-facing
    requests_total: IntCounter,
    request_failures: IntCounter,
    degraded_responses: IntCounter,
    coalesced_requests: IntCounter,

    // Upstream calls, labelled by call kind
    upstream_requests: IntCounterVec,
    upstream_failures: IntCounterVec,
    upstream_latency: HistogramVec,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let requests_total = IntCounter::with_opts(Opts::new(
            "catalog_requests_total",
            "Total number of game catalog requests served",
        ))?;

        let request_failures = IntCounter::with_opts(Opts::new(
            "catalog_request_failures_total",
            "Total number of game catalog requests answered with an error",
        ))?;

        let degraded_responses = IntCounter::with_opts(Opts::new(
            "catalog_degraded_responses_total",
            "Responses served with placeholder icons after a thumbnail failure",
        ))?;

        let coalesced_requests = IntCounter::with_opts(Opts::new(
            "catalog_coalesced_requests_total",
            "Requests that joined an identical in-flight upstream fan-out",
        ))?;

        let upstream_requests = IntCounterVec::new(
            Opts::new(
                "catalog_upstream_requests_total",
                "Logical upstream calls issued; retries of one call count once",
            ),
            &["call"],
        )?;

        let upstream_failures = IntCounterVec::new(
            Opts::new(
                "catalog_upstream_failures_total",
                "Total number of upstream calls that failed after retries",
            ),
            &["call"],
        )?;

        let upstream_latency = HistogramVec::new(
            HistogramOpts::new(
                "catalog_upstream_latency_seconds",
                "Duration of upstream calls in seconds, including retries",
            )
            .buckets(vec![
                0.010, 0.025, 0.050, 0.100, 0.250, 0.500, 1.0, 2.0, 5.0, 10.0,
            ]),
            &["call"],
        )?;

        register(&registry, &requests_total)?;
        register(&registry, &request_failures)?;
        register(&registry, &degraded_responses)?;
        register(&registry, &coalesced_requests)?;
        register(&registry, &upstream_requests)?;
        register(&registry, &upstream_failures)?;
        register(&registry, &upstream_latency)?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            request_failures,
            degraded_responses,
            coalesced_requests,
            upstream_requests,
            upstream_failures,
            upstream_latency,
        })
    }

    pub fn record_request(&self) {
        self.requests_total.inc();
    }

    pub fn record_request_failure(&self) {
        self.request_failures.inc();
    }

    pub fn record_degraded_response(&self) {
        self.degraded_responses.inc();
    }

    pub fn record_coalesced_request(&self) {
        self.coalesced_requests.inc();
    }

    pub fn record_upstream_request(&self, call: CallKind) {
        self.upstream_requests.with_label_values(&[call.as_str()]).inc();
    }

    pub fn record_upstream_failure(&self, call: CallKind) {
        self.upstream_failures.with_label_values(&[call.as_str()]).inc();
    }

    /// Observe latency for one upstream call in seconds
    pub fn record_upstream_latency(&self, call: CallKind, seconds: f64) {
        self.upstream_latency
            .with_label_values(&[call.as_str()])
            .observe(seconds);
    }

    pub fn upstream_requests(&self, call: CallKind) -> u64 {
        self.upstream_requests.with_label_values(&[call.as_str()]).get()
    }

    pub fn degraded_responses(&self) -> u64 {
        self.degraded_responses.get()
    }

    pub fn coalesced_requests(&self) -> u64 {
        self.coalesced_requests.get()
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, AppError> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        encoder
            .encode(&metric_families, &mut buffer)
            .context("Failed to encode metrics")?;

        Ok(String::from_utf8(buffer).context("Metrics output was not valid UTF-8")?)
    }
}

fn register<C>(registry: &Registry, collector: &C) -> anyhow::Result<()>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .context("Failed to register metric")
}
