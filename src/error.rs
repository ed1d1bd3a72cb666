// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Domain error taxonomy shared by the repositories, the ledger, the trade
//! orchestrator and the HTTP layer.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

pub type Result<T, E = MarketError> = std::result::Result<T, E>;

/// Identifies the row a lookup or uniqueness check was about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorExtra {
    pub model: String,
    pub field: String,
    pub value: String,
}

impl ErrorExtra {
    pub fn new(model: &str, field: &str, value: impl ToString) -> Self {
        Self {
            model: model.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ErrorExtra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}={}", self.model, self.field, self.value)
    }
}

#[derive(Debug, Error)]
pub enum MarketError {
    /// A business rule was violated (bad buyer/seller pairing, overdraft...).
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(ErrorExtra),

    #[error("{0} already exists")]
    AlreadyExists(ErrorExtra),

    /// The row changed between validation and write.
    #[error("{0} was modified by another request")]
    Conflict(ErrorExtra),

    /// The request was well-formed JSON but carried an unacceptable value.
    #[error("{0}")]
    Validation(String),

    #[error("{detail}")]
    Internal {
        detail: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MarketError {
    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::BadRequest(detail.into())
    }

    pub fn not_found(model: &str, field: &str, value: impl ToString) -> Self {
        Self::NotFound(ErrorExtra::new(model, field, value))
    }

    pub fn already_exists(model: &str, field: &str, value: impl ToString) -> Self {
        Self::AlreadyExists(ErrorExtra::new(model, field, value))
    }

    pub fn conflict(model: &str, field: &str, value: impl ToString) -> Self {
        Self::Conflict(ErrorExtra::new(model, field, value))
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
            source: None,
        }
    }

    pub fn internal_with<E>(detail: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            detail: detail.into(),
            source: Some(Box::new(source)),
        }
    }

    /// HTTP status code this error maps to at the transport boundary.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::NotFound(_) => 404,
            Self::AlreadyExists(_) | Self::Conflict(_) => 409,
            Self::Validation(_) => 422,
            Self::Internal { .. } => 500,
        }
    }

    /// Machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "invalid_request",
            Self::NotFound(_) => "resource_not_found",
            Self::AlreadyExists(_) => "resource_already_exists",
            Self::Conflict(_) => "conflict",
            Self::Validation(_) => "validation_error",
            Self::Internal { .. } => "internal_error",
        }
    }

    pub fn extra(&self) -> Option<&ErrorExtra> {
        match self {
            Self::NotFound(extra) | Self::AlreadyExists(extra) | Self::Conflict(extra) => {
                Some(extra)
            }
            _ => None,
        }
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }
}

impl From<rusqlite::Error> for MarketError {
    fn from(e: rusqlite::Error) -> Self {
        Self::internal_with("Database error", e)
    }
}

impl From<std::io::Error> for MarketError {
    fn from(e: std::io::Error) -> Self {
        Self::internal_with("File storage error", e)
    }
}
