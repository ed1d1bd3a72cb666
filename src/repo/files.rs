// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{MarketError, Result};
use crate::models::AssetFile;
use crate::storage::StoredFile;

pub fn create(conn: &Connection, stored: &StoredFile) -> Result<AssetFile> {
    conn.execute(
        "INSERT INTO asset_files(filename, hashed_name, thumbnail) VALUES (?1, ?2, ?3)",
        params![stored.filename, stored.hashed_name, stored.thumbnail],
    )?;
    Ok(AssetFile {
        id: conn.last_insert_rowid(),
        filename: stored.filename.clone(),
        hashed_name: stored.hashed_name.clone(),
        thumbnail: stored.thumbnail.clone(),
    })
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<AssetFile> {
    conn.query_row(
        "SELECT id, filename, hashed_name, thumbnail FROM asset_files WHERE id=?1",
        params![id],
        |r| {
            Ok(AssetFile {
                id: r.get(0)?,
                filename: r.get(1)?,
                hashed_name: r.get(2)?,
                thumbnail: r.get(3)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| MarketError::not_found("AssetFile", "id", id))
}
