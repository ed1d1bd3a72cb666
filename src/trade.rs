// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Ownership transfer as a single unit of work.
//!
//! A trade validates the acting identity against the buyer/seller pair and the
//! asset's current owner, then stages the owner change, the transaction record
//! and the ledger movements on one SQLite transaction. Either all of it is
//! committed or none of it is.

use rusqlite::{Connection, TransactionBehavior};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::context::Context;
use crate::error::{MarketError, Result};
use crate::ledger;
use crate::models::{Asset, BalanceMovement, Transaction, TransactionView, User, UserView};
use crate::repo::{assets, transactions, users};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeRequest {
    pub buyer: String,
    pub seller: String,
    pub price: Decimal,
}

/// Which side of the trade the acting identity must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeKind {
    Buy,
    Sell,
}

#[derive(Debug, Clone)]
pub struct TradeReceipt {
    pub transaction: Transaction,
    pub buyer: UserView,
    pub seller: UserView,
    pub movements: Vec<BalanceMovement>,
}

impl TradeReceipt {
    pub fn view(&self) -> TransactionView {
        TransactionView {
            id: self.transaction.id,
            creation_date: self.transaction.creation_date,
            nft_id: self.transaction.asset_id,
            buyer: self.buyer.clone(),
            seller: self.seller.clone(),
            price: self.transaction.price,
        }
    }
}

fn validate_buy(ctx: &Context, buyer: &User, seller: &User, asset: &Asset) -> Result<()> {
    if buyer.username != ctx.username || seller.id != asset.owner_id {
        return Err(MarketError::bad_request("Either Buyer or Seller is invalid"));
    }
    if buyer.id == asset.owner_id {
        return Err(MarketError::bad_request(format!(
            "User {} cannot buy requested NFT",
            buyer.username
        )));
    }
    Ok(())
}

fn validate_sell(ctx: &Context, seller: &User, asset: &Asset) -> Result<()> {
    if seller.username != ctx.username {
        return Err(MarketError::bad_request("Seller is invalid"));
    }
    if seller.id != asset.owner_id {
        return Err(MarketError::bad_request(format!(
            "User {} cannot sell requested NFT",
            seller.username
        )));
    }
    Ok(())
}

/// Resolve, validate and stage one trade on `conn`, which must be inside a
/// transaction the caller will commit or drop.
fn stage_trade(
    conn: &Connection,
    ctx: &Context,
    asset_id: i64,
    req: &TradeRequest,
    kind: TradeKind,
) -> Result<TradeReceipt> {
    let buyer = users::get_by_username(conn, &req.buyer)?;
    let seller = users::get_by_username(conn, &req.seller)?;
    let asset = assets::get_by_id(conn, asset_id)?;

    match kind {
        TradeKind::Buy => validate_buy(ctx, &buyer, &seller, &asset)?,
        TradeKind::Sell => validate_sell(ctx, &seller, &asset)?,
    }
    if buyer.username == seller.username {
        return Err(MarketError::bad_request(
            "Buyer and Seller must be different users",
        ));
    }

    assets::reassign_owner(conn, ctx, &asset, buyer.id)?;
    let transaction =
        transactions::create(conn, ctx, asset.id, buyer.id, seller.id, req.price)?;
    let creators = assets::creators_of(conn, asset.id)?;
    let movements = ledger::apply_trade_ledger(conn, ctx, &transaction, &creators)?;

    Ok(TradeReceipt {
        transaction,
        buyer: UserView::from(&buyer),
        seller: UserView::from(&seller),
        movements,
    })
}

/// Execute one trade of `asset_id` as the acting identity in `ctx`.
///
/// The write lock is taken up front (`BEGIN IMMEDIATE`) so the ownership
/// checks are made against the state the writes will land on. Any error
/// drops the transaction, which rolls back every staged write, and is
/// returned unchanged.
pub fn trade(
    conn: &mut Connection,
    ctx: &Context,
    asset_id: i64,
    req: &TradeRequest,
    kind: TradeKind,
) -> Result<TradeReceipt> {
    if req.price < Decimal::ZERO {
        return Err(MarketError::Validation("price cannot be negative".into()));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    match stage_trade(&tx, ctx, asset_id, req, kind) {
        Ok(receipt) => {
            tx.commit()?;
            info!(
                transaction_id = receipt.transaction.id,
                asset_id,
                buyer = %receipt.buyer.username,
                seller = %receipt.seller.username,
                price = %req.price,
                "trade committed"
            );
            Ok(receipt)
        }
        Err(e) => {
            drop(tx);
            if e.is_internal() {
                error!(asset_id, acting = %ctx.username, error = ?e, "trade rolled back");
            } else {
                warn!(asset_id, acting = %ctx.username, error = %e, "trade rejected");
            }
            Err(e)
        }
    }
}
