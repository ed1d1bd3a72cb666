// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::error::{ErrorExtra, MarketError};

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status_code: u16,
    pub error: &'static str,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<ErrorExtra>,
}

/// Wrapper so domain errors can be returned straight from handlers.
#[derive(Debug)]
pub struct ApiError(pub MarketError);

impl ApiError {
    pub fn validation(detail: impl Into<String>) -> Self {
        Self(MarketError::Validation(detail.into()))
    }
}

impl From<MarketError> for ApiError {
    fn from(error: MarketError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = self.0;
        let status =
            StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let detail = if err.is_internal() {
            error!(error = ?err, "request failed");
            "Internal Server Error".to_string()
        } else {
            err.to_string()
        };

        let body = ErrorBody {
            status_code: status.as_u16(),
            error: err.code(),
            detail,
            extra: err.extra().cloned(),
        };
        (status, Json(body)).into_response()
    }
}
