// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{AUDIT_COLUMNS, Page, audit_cols, is_unique_violation};
use crate::context::Context;
use crate::error::{MarketError, Result};
use crate::models::User;

fn select_sql(tail: &str) -> String {
    format!("SELECT id, username, date_joined, {AUDIT_COLUMNS} FROM users {tail}")
}

pub(crate) fn from_row(r: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: r.get(0)?,
        username: r.get(1)?,
        date_joined: r.get(2)?,
        audit: audit_cols(r, 3)?,
    })
}

pub fn create(conn: &Connection, ctx: &Context, username: &str) -> Result<User> {
    let username = username.trim();
    if username.is_empty() {
        return Err(MarketError::Validation("username must not be empty".into()));
    }
    let audit = ctx.stamp();
    let date_joined = ctx.system_date.date_naive();
    conn.execute(
        "INSERT INTO users(username, date_joined, created_by, created_at, modified_by, modified_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            username,
            date_joined,
            audit.created_by,
            audit.created_at,
            audit.modified_by,
            audit.modified_at,
            audit.version
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            MarketError::already_exists("User", "username", username)
        } else {
            e.into()
        }
    })?;
    Ok(User {
        id: conn.last_insert_rowid(),
        username: username.to_string(),
        date_joined,
        audit,
    })
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<User> {
    conn.query_row(&select_sql("WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| MarketError::not_found("User", "user_id", id))
}

pub fn find_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    Ok(conn
        .query_row(&select_sql("WHERE username=?1"), params![username], from_row)
        .optional()?)
}

pub fn get_by_username(conn: &Connection, username: &str) -> Result<User> {
    find_by_username(conn, username)?
        .ok_or_else(|| MarketError::not_found("User", "username", username))
}

/// Newest members first.
pub fn list(conn: &Connection, page: Page) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&select_sql(
        "ORDER BY date_joined DESC, id DESC LIMIT ?1 OFFSET ?2",
    ))?;
    let rows = stmt.query_map(params![page.limit, page.offset], from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}
