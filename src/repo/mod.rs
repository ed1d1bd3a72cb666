// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Typed persistence for users, assets, transactions and balance movements.
//!
//! Every function takes a `&Connection`. Called with an open
//! `rusqlite::Transaction` (which derefs to a connection) the write is staged
//! until the caller commits; called with a plain connection it is committed
//! immediately.

pub mod assets;
pub mod balances;
pub mod files;
pub mod transactions;
pub mod users;

use rusqlite::Row;
use rusqlite::types::Type;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::{MarketError, Result};
use crate::models::Audit;

/// Offset pagination used by every list operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub offset: u32,
    #[serde(default = "Page::default_limit")]
    pub limit: u32,
}

impl Page {
    pub const MAX_LIMIT: u32 = 50;

    fn default_limit() -> u32 {
        Self::MAX_LIMIT
    }

    pub fn new(offset: u32, limit: u32) -> Result<Self> {
        Self { offset, limit }.validated()
    }

    pub fn validated(self) -> Result<Self> {
        if self.limit > Self::MAX_LIMIT {
            return Err(MarketError::Validation(format!(
                "limit must be at most {}",
                Self::MAX_LIMIT
            )));
        }
        Ok(self)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: Self::MAX_LIMIT,
        }
    }
}

pub(crate) const AUDIT_COLUMNS: &str = "created_by, created_at, modified_by, modified_at, version";

/// Read the five audit columns starting at `start`.
pub(crate) fn audit_cols(row: &Row<'_>, start: usize) -> rusqlite::Result<Audit> {
    Ok(Audit {
        created_by: row.get(start)?,
        created_at: row.get(start + 1)?,
        modified_by: row.get(start + 2)?,
        modified_at: row.get(start + 3)?,
        version: row.get(start + 4)?,
    })
}

/// Amounts are stored as TEXT to keep exact decimal precision.
pub(crate) fn decimal_col(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let raw: String = row.get(idx)?;
    raw.parse::<Decimal>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _)
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
