// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, Row, params};

use super::{AUDIT_COLUMNS, Page, audit_cols};
use crate::context::Context;
use crate::error::{MarketError, Result};
use crate::models::{Asset, User};

pub const MAX_DESCRIPTION_LEN: usize = 500;

fn select_sql(tail: &str) -> String {
    format!(
        "SELECT id, description, file_id, owner_id, creation_date, {AUDIT_COLUMNS} FROM assets {tail}"
    )
}

fn from_row(r: &Row<'_>) -> rusqlite::Result<Asset> {
    Ok(Asset {
        id: r.get(0)?,
        description: r.get(1)?,
        file_id: r.get(2)?,
        owner_id: r.get(3)?,
        creation_date: r.get(4)?,
        audit: audit_cols(r, 5)?,
    })
}

/// Insert the asset and link its co-creators in the given order.
pub fn create(
    conn: &Connection,
    ctx: &Context,
    owner_id: i64,
    description: &str,
    file_id: i64,
    creator_ids: &[i64],
) -> Result<Asset> {
    if description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(MarketError::Validation(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    let audit = ctx.stamp();
    conn.execute(
        "INSERT INTO assets(description, file_id, owner_id, creation_date, created_by, created_at, modified_by, modified_at, version)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            description,
            file_id,
            owner_id,
            ctx.system_date,
            audit.created_by,
            audit.created_at,
            audit.modified_by,
            audit.modified_at,
            audit.version
        ],
    )?;
    let id = conn.last_insert_rowid();

    let mut link = conn.prepare_cached(
        "INSERT INTO asset_creators(asset_id, creator_id, position) VALUES (?1, ?2, ?3)",
    )?;
    for (position, creator_id) in creator_ids.iter().enumerate() {
        link.execute(params![id, creator_id, position as i64])?;
    }

    Ok(Asset {
        id,
        description: description.to_string(),
        file_id,
        owner_id,
        creation_date: ctx.system_date,
        audit,
    })
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Asset> {
    conn.query_row(&select_sql("WHERE id=?1"), params![id], from_row)
        .optional()?
        .ok_or_else(|| MarketError::not_found("NFT", "id", id))
}

pub fn list(conn: &Connection, page: Page) -> Result<Vec<Asset>> {
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

/// Co-creators in mint order.
pub fn creators_of(conn: &Connection, asset_id: i64) -> Result<Vec<User>> {
    let mut stmt = conn.prepare_cached(
        "SELECT u.id, u.username, u.date_joined, u.created_by, u.created_at, u.modified_by, u.modified_at, u.version
         FROM asset_creators c JOIN users u ON u.id = c.creator_id
         WHERE c.asset_id=?1 ORDER BY c.position",
    )?;
    let rows = stmt.query_map(params![asset_id], super::users::from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Move ownership to `new_owner_id`.
///
/// The write only lands if the row still has the owner and version that
/// `asset` was read with; otherwise another trade got there first and a
/// Conflict is returned. Co-creators are never touched.
pub fn reassign_owner(
    conn: &Connection,
    ctx: &Context,
    asset: &Asset,
    new_owner_id: i64,
) -> Result<Asset> {
    let mut updated = asset.clone();
    updated.owner_id = new_owner_id;
    updated.audit.touch(ctx);

    let changed = conn.execute(
        "UPDATE assets SET owner_id=?1, modified_by=?2, modified_at=?3, version=?4
         WHERE id=?5 AND owner_id=?6 AND version=?7",
        params![
            updated.owner_id,
            updated.audit.modified_by,
            updated.audit.modified_at,
            updated.audit.version,
            asset.id,
            asset.owner_id,
            asset.audit.version
        ],
    )?;
    if changed == 0 {
        return Err(MarketError::conflict("NFT", "id", asset.id));
    }
    Ok(updated)
}
