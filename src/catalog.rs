// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-side views shared by the HTTP handlers and the CLI.

use std::collections::HashMap;

use rusqlite::Connection;
use rust_decimal::Decimal;

use crate::error::Result;
use crate::ledger;
use crate::models::{
    Asset, AssetDetail, AssetSummary, BalanceMovement, BalanceView, FileView, ThumbnailView,
    Transaction, TransactionView, UserView,
};
use crate::repo::{Page, assets, balances, files, transactions, users};
use crate::storage::FileStore;

/// Small per-call cache so a page of rows does not look up the same user
/// over and over.
#[derive(Default)]
struct UserViews(HashMap<i64, UserView>);

impl UserViews {
    fn get(&mut self, conn: &Connection, id: i64) -> Result<UserView> {
        if let Some(v) = self.0.get(&id) {
            return Ok(v.clone());
        }
        let view = UserView::from(&users::get_by_id(conn, id)?);
        self.0.insert(id, view.clone());
        Ok(view)
    }
}

pub fn list_users(conn: &Connection, page: Page) -> Result<Vec<UserView>> {
    Ok(users::list(conn, page.validated()?)?
        .iter()
        .map(UserView::from)
        .collect())
}

pub fn get_user(conn: &Connection, user_id: i64) -> Result<UserView> {
    Ok(UserView::from(&users::get_by_id(conn, user_id)?))
}

fn parties(conn: &Connection, cache: &mut UserViews, asset: &Asset) -> Result<(UserView, Vec<UserView>)> {
    let owner = cache.get(conn, asset.owner_id)?;
    let creators = assets::creators_of(conn, asset.id)?
        .iter()
        .map(UserView::from)
        .collect();
    Ok((owner, creators))
}

/// Newest assets first, each with its thumbnail inlined.
pub fn list_assets(conn: &Connection, store: &dyn FileStore, page: Page) -> Result<Vec<AssetSummary>> {
    let mut cache = UserViews::default();
    let mut out = Vec::new();
    for asset in assets::list(conn, page.validated()?)? {
        let (owner, creators) = parties(conn, &mut cache, &asset)?;
        let file = files::get_by_id(conn, asset.file_id)?;
        out.push(AssetSummary {
            id: asset.id,
            creation_date: asset.creation_date,
            description: asset.description,
            owner,
            creators,
            file: ThumbnailView {
                thumbnail: store.read_base64(&file.thumbnail)?,
                filename: file.filename,
            },
        });
    }
    Ok(out)
}

/// One asset with the original image inlined.
pub fn get_asset(conn: &Connection, store: &dyn FileStore, asset_id: i64) -> Result<AssetDetail> {
    let asset = assets::get_by_id(conn, asset_id)?;
    let (owner, creators) = parties(conn, &mut UserViews::default(), &asset)?;
    let file = files::get_by_id(conn, asset.file_id)?;
    Ok(AssetDetail {
        id: asset.id,
        creation_date: asset.creation_date,
        description: asset.description,
        owner,
        creators,
        file: FileView {
            file: store.read_base64(&file.hashed_name)?,
            filename: file.filename,
        },
    })
}

fn transaction_view(conn: &Connection, cache: &mut UserViews, t: Transaction) -> Result<TransactionView> {
    Ok(TransactionView {
        id: t.id,
        creation_date: t.creation_date,
        nft_id: t.asset_id,
        buyer: cache.get(conn, t.buyer_id)?,
        seller: cache.get(conn, t.seller_id)?,
        price: t.price,
    })
}

pub fn list_transactions(conn: &Connection, page: Page) -> Result<Vec<TransactionView>> {
    let mut cache = UserViews::default();
    transactions::list(conn, page.validated()?)?
        .into_iter()
        .map(|t| transaction_view(conn, &mut cache, t))
        .collect()
}

/// Trade history of one asset, newest first.
pub fn asset_history(conn: &Connection, asset_id: i64) -> Result<Vec<TransactionView>> {
    assets::get_by_id(conn, asset_id)?;
    let mut cache = UserViews::default();
    transactions::list_for_asset(conn, asset_id)?
        .into_iter()
        .map(|t| transaction_view(conn, &mut cache, t))
        .collect()
}

fn balance_view(conn: &Connection, cache: &mut UserViews, m: BalanceMovement) -> Result<BalanceView> {
    Ok(BalanceView {
        id: m.id,
        creation_date: m.creation_date,
        user: cache.get(conn, m.user_id)?,
        transaction_id: m.transaction_id,
        initial_amount: m.initial_amount,
        final_amount: m.final_amount,
    })
}

pub fn balance_history(conn: &Connection, page: Page) -> Result<Vec<BalanceView>> {
    let mut cache = UserViews::default();
    balances::list(conn, page.validated()?)?
        .into_iter()
        .map(|m| balance_view(conn, &mut cache, m))
        .collect()
}

/// Movements of one user, newest first. Unknown users are a NotFound.
pub fn user_balance_history(conn: &Connection, user_id: i64, page: Page) -> Result<Vec<BalanceView>> {
    let mut cache = UserViews::default();
    cache.get(conn, user_id)?;
    balances::list_for_user(conn, user_id, page.validated()?)?
        .into_iter()
        .map(|m| balance_view(conn, &mut cache, m))
        .collect()
}

pub fn current_balance(conn: &Connection, username: &str) -> Result<(UserView, Decimal)> {
    let user = users::get_by_username(conn, username)?;
    let amount = ledger::current_balance(conn, user.id)?;
    Ok((UserView::from(&user), amount))
}
