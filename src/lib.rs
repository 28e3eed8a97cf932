// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Aggregation proxy that joins game listings with their icon thumbnails.
//!
//! A query is routed to one listing call, the listed games' details and icons
//! are fetched concurrently, and the two are joined into [`model::GameSummary`]
//! records. Icon failures degrade to placeholder icons; listing or detail
//! failures become a structured error response.

pub mod api;
pub mod cache;
pub mod coalesce;
pub mod config;
pub mod error;
pub mod join;
pub mod metrics;
pub mod model;
pub mod router;
pub mod service;
pub mod upstream;

pub use api::{build_router, AppState};
