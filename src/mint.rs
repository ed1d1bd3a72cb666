// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Creating a new asset from an uploaded image.
//!
//! The file is written first, then the asset file row, the asset and its
//! co-creator links are inserted in one transaction. If the database part
//! fails the stored files are removed again.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rusqlite::Connection;
use tracing::{error, info, warn};

use crate::context::Context;
use crate::error::{MarketError, Result};
use crate::models::{AssetDetail, FileView, User, UserView};
use crate::repo::assets::MAX_DESCRIPTION_LEN;
use crate::repo::{assets, files, users};
use crate::storage::FileStore;

#[derive(Debug, Clone)]
pub struct MintRequest {
    pub description: String,
    /// Usernames, in the order the fee will be paid out.
    pub creators: Vec<String>,
    pub filename: String,
    pub bytes: Vec<u8>,
}

fn resolve_creators(conn: &Connection, names: &[String]) -> Result<Vec<User>> {
    let mut out: Vec<User> = Vec::with_capacity(names.len());
    for name in names {
        let user = users::get_by_username(conn, name.trim())?;
        if out.iter().any(|u| u.id == user.id) {
            return Err(MarketError::bad_request(format!(
                "Co-creator {} was given more than once",
                user.username
            )));
        }
        out.push(user);
    }
    Ok(out)
}

/// Mint an asset owned by the acting identity.
pub fn mint(
    conn: &mut Connection,
    store: &dyn FileStore,
    ctx: &Context,
    req: &MintRequest,
) -> Result<AssetDetail> {
    if req.description.chars().count() > MAX_DESCRIPTION_LEN {
        return Err(MarketError::Validation(format!(
            "description must be at most {} characters",
            MAX_DESCRIPTION_LEN
        )));
    }
    let owner = users::get_by_username(conn, &ctx.username)?;
    let creators = resolve_creators(conn, &req.creators)?;
    let creator_ids: Vec<i64> = creators.iter().map(|u| u.id).collect();

    let stored = store.store(&req.filename, &req.bytes)?;

    let written = (|| -> Result<_> {
        let tx = conn.transaction()?;
        let file = files::create(&tx, &stored)?;
        let asset = assets::create(&tx, ctx, owner.id, &req.description, file.id, &creator_ids)?;
        tx.commit()?;
        Ok((asset, file))
    })();

    let (asset, file) = match written {
        Ok(pair) => pair,
        Err(e) => {
            error!(acting = %ctx.username, file = %stored.hashed_name, error = ?e, "mint failed");
            if let Err(cleanup) = store.remove(&stored) {
                warn!(file = %stored.hashed_name, error = ?cleanup, "could not remove file of failed mint");
            }
            return Err(MarketError::internal_with("Error trying to mint NFT", e));
        }
    };

    info!(asset_id = asset.id, owner = %owner.username, creators = creators.len(), "minted NFT");
    Ok(AssetDetail {
        id: asset.id,
        creation_date: asset.creation_date,
        description: asset.description,
        owner: UserView::from(&owner),
        creators: creators.iter().map(UserView::from).collect(),
        file: FileView {
            filename: file.filename,
            file: STANDARD.encode(&req.bytes),
        },
    })
}
