// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use super::{AUDIT_COLUMNS, Page, audit_cols, decimal_col};
use crate::context::Context;
use crate::error::Result;
use crate::models::BalanceMovement;

fn select_sql(tail: &str) -> String {
    format!(
        "SELECT id, user_id, transaction_id, initial_amount, final_amount, creation_date, {AUDIT_COLUMNS} FROM balance_movements {tail}"
    )
}

fn from_row(r: &Row<'_>) -> rusqlite::Result<BalanceMovement> {
    Ok(BalanceMovement {
        id: r.get(0)?,
        user_id: r.get(1)?,
        transaction_id: r.get(2)?,
        initial_amount: decimal_col(r, 3)?,
        final_amount: decimal_col(r, 4)?,
        creation_date: r.get(5)?,
        audit: audit_cols(r, 6)?,
    })
}

fn collect(conn: &Connection, sql: &str, p: impl rusqlite::Params) -> Result<Vec<BalanceMovement>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(p, from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Append one movement. Callers are responsible for chaining
/// `initial_amount` to the previous `final_amount`; see `ledger`.
pub fn create(
    conn: &Connection,
    ctx: &Context,
    user_id: i64,
    transaction_id: Option<i64>,
    initial_amount: Decimal,
    final_amount: Decimal,
) -> Result<BalanceMovement> {
    let audit = ctx.stamp();
    conn.execute(
        "INSERT INTO balance_movements(user_id, transaction_id, initial_amount, final_amount, creation_date, created_by, created_at, modified_by, modified_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            user_id,
            transaction_id,
            initial_amount.to_string(),
            final_amount.to_string(),
            ctx.system_date,
            audit.created_by,
            audit.created_at,
            audit.modified_by,
            audit.modified_at,
            audit.version
        ],
    )?;
    Ok(BalanceMovement {
        id: conn.last_insert_rowid(),
        user_id,
        transaction_id,
        initial_amount,
        final_amount,
        creation_date: ctx.system_date,
        audit,
    })
}

/// The user's newest movement, by insertion sequence.
pub fn latest_for_user(conn: &Connection, user_id: i64) -> Result<Option<BalanceMovement>> {
    Ok(conn
        .query_row(
            &select_sql("WHERE user_id=?1 ORDER BY id DESC LIMIT 1"),
            params![user_id],
            from_row,
        )
        .optional()?)
}

pub fn list(conn: &Connection, page: Page) -> Result<Vec<BalanceMovement>> {
    collect(
        conn,
        &select_sql("ORDER BY creation_date DESC, id DESC LIMIT ?1 OFFSET ?2"),
        params![page.limit, page.offset],
    )
}

pub fn list_for_user(conn: &Connection, user_id: i64, page: Page) -> Result<Vec<BalanceMovement>> {
    collect(
        conn,
        &select_sql("WHERE user_id=?1 ORDER BY creation_date DESC, id DESC LIMIT ?2 OFFSET ?3"),
        params![user_id, page.limit, page.offset],
    )
}

/// Movements produced by one trade, in the order they were applied.
pub fn list_for_transaction(conn: &Connection, transaction_id: i64) -> Result<Vec<BalanceMovement>> {
    collect(
        conn,
        &select_sql("WHERE transaction_id=?1 ORDER BY id"),
        params![transaction_id],
    )
}

/// Whole ledger oldest first; used by the exporter and the doctor.
pub fn all(conn: &Connection) -> Result<Vec<BalanceMovement>> {
    collect(conn, &select_sql("ORDER BY id"), [])
}
