// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Chooses which listing request a client query maps to.

use std::fmt;

const LISTING_PATH: &str = "/v1/games/list";

/// Descriptor of the single listing call issued for a client query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ListingRequest {
    /// Keyword search. Holds the trimmed, unencoded term.
    Keyword(String),
    /// Default popularity ordering, no filter.
    Popular,
}

impl ListingRequest {
    /// Route an optional client term. Blank terms fall back to the popularity listing.
    pub fn route(term: Option<&str>) -> Self {
        match term.map(str::trim) {
            Some(term) if !term.is_empty() => Self::Keyword(term.to_string()),
            _ => Self::Popular,
        }
    }

    /// Path and query string relative to the games API base URL.
    pub fn path_and_query(&self) -> String {
        match self {
            Self::Keyword(term) => {
                format!("{LISTING_PATH}?model.keyword={}", urlencoding::encode(term))
            }
            Self::Popular => format!("{LISTING_PATH}?model.sortToken="),
        }
    }
}

impl fmt::Display for ListingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(term) => write!(f, "keyword:{term}"),
            Self::Popular => f.write_str("popular"),
        }
    }
}
