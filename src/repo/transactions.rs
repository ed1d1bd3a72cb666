// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use super::{AUDIT_COLUMNS, Page, audit_cols, decimal_col};
use crate::context::Context;
use crate::error::{MarketError, Result};
use crate::models::Transaction;

fn select_sql(tail: &str) -> String {
    format!(
        "SELECT id, asset_id, buyer_id, seller_id, price, creation_date, {AUDIT_COLUMNS} FROM transactions {tail}"
    )
}

fn from_row(r: &Row<'_>) -> rusqlite::Result<Transaction> {
    Ok(Transaction {
        id: r.get(0)?,
        asset_id: r.get(1)?,
        buyer_id: r.get(2)?,
        seller_id: r.get(3)?,
        price: decimal_col(r, 4)?,
        creation_date: r.get(5)?,
        audit: audit_cols(r, 6)?,
    })
}

pub fn create(
    conn: &Connection,
    ctx: &Context,
    asset_id: i64,
    buyer_id: i64,
    seller_id: i64,
    price: Decimal,
) -> Result<Transaction> {
    let audit = ctx.stamp();
    conn.execute(
        "INSERT INTO transactions(asset_id, buyer_id, seller_id, price, creation_date, created_by, created_at, modified_by, modified_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            asset_id,
            buyer_id,
            seller_id,
            price.to_string(),
            ctx.system_date,
            audit.created_by,
            audit.created_at,
            audit.modified_by,
            audit.modified_at,
            audit.version
        ],
    )?;
    Ok(Transaction {
        id: conn.last_insert_rowid(),
        asset_id,
        buyer_id,
        seller_id,
        price,
        creation_date: ctx.system_date,
        audit,
    })
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Transaction> {
    conn.query_row(&select_sql("WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| MarketError::not_found("Transaction", "id", id))
}

pub fn list(conn: &Connection, page: Page) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&select_sql(
        "ORDER BY creation_date DESC, id DESC LIMIT ?1 OFFSET ?2",
    ))?;
    let rows = stmt.query_map(params![page.limit, page.offset], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Every trade of one asset, newest first.
pub fn list_for_asset(conn: &Connection, asset_id: i64) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&select_sql(
        "WHERE asset_id=?1 ORDER BY creation_date DESC, id DESC",
    ))?;
    let rows = stmt.query_map(params![asset_id], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Whole table oldest first; used by the exporter and the doctor.
pub fn all(conn: &Connection) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(&select_sql("ORDER BY id"))?;
    let rows = stmt.query_map([], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
