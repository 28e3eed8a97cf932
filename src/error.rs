// Copyright 2025 Memophor Labs
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy exposed to clients.
//!
//! Upstream details are logged where the failure is classified and never make
//! it into a response body.

use axum::extract::rejection::QueryRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::model::ErrorBody;
use crate::upstream::{CallKind, UpstreamError};

/// A primary upstream stage (listing or details) that could not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{call} call failed: {source}")]
pub struct FetchError {
    pub call: CallKind,
    pub source: UpstreamError,
}

impl FetchError {
    pub fn new(call: CallKind, source: UpstreamError) -> Self {
        Self { call, source }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("The game catalog is currently unavailable.")]
    UpstreamUnavailable,
    #[error("The game catalog took too long to respond.")]
    UpstreamTimeout,
    #[error("The game catalog returned an unexpected response.")]
    UpstreamMalformedResponse,
    #[error("Something went wrong while fetching games.")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn bad_request<T: Into<String>>(message: T) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            AppError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::UpstreamMalformedResponse => StatusCode::BAD_GATEWAY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FetchError> for AppError {
    fn from(error: FetchError) -> Self {
        tracing::error!(call = %error.call, error = %error.source, "upstream call failed");

        match error.source {
            UpstreamError::Timeout => AppError::UpstreamTimeout,
            UpstreamError::Unavailable(_) | UpstreamError::Http(_) => AppError::UpstreamUnavailable,
            UpstreamError::Malformed(_) => AppError::UpstreamMalformedResponse,
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "rejected query string");
        AppError::bad_request("The query string could not be parsed.")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal(error) = &self {
            tracing::error!(error = ?error, "unhandled error while serving request");
        }

        let body = ErrorBody {
            message: self.to_string(),
        };

        (self.status(), Json(body)).into_response()
    }
}
