// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Balance movements produced by a trade.
//!
//! A user's balance is never stored as a column: it is the `final_amount` of
//! their newest movement. Every change appends a movement whose
//! `initial_amount` is the previous `final_amount`, and no movement may leave
//! a balance below zero.
//!
//! For a trade at price `P` with `C` co-creators the buyer pays `P`, each
//! co-creator receives `P * 0.20 / C` truncated to [`FEE_SCALE`] places and
//! the seller receives `P * 0.80` plus whatever the truncation left over of
//! the co-creator pool. With co-creators the deltas of a trade sum to zero.

use rusqlite::Connection;
use rust_decimal::{Decimal, RoundingStrategy};
use tracing::debug;

use crate::context::Context;
use crate::error::{MarketError, Result};
use crate::models::{BalanceMovement, Transaction, User};
use crate::repo::balances;

/// Share of the price split evenly between co-creators.
pub const COCREATOR_FEE_RATIO: Decimal = Decimal::from_parts(20, 0, 0, false, 2);
/// Share of the price paid to the seller.
pub const OWNER_FEE_RATIO: Decimal = Decimal::from_parts(80, 0, 0, false, 2);
/// Decimal places kept on each co-creator's share.
pub const FEE_SCALE: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Leg {
    Buyer,
    CoCreator,
    Seller,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMovement {
    pub leg: Leg,
    pub user_id: i64,
    /// Signed: negative for the buyer's debit.
    pub delta: Decimal,
}

/// Deltas for one trade in application order: buyer debit, co-creator
/// credits in their stored order, seller credit.
pub fn plan_trade(
    buyer_id: i64,
    seller_id: i64,
    price: Decimal,
    creator_ids: &[i64],
) -> Result<Vec<PlannedMovement>> {
    let overflow = || MarketError::bad_request("Price is too large");

    let mut plan = Vec::with_capacity(creator_ids.len() + 2);
    plan.push(PlannedMovement {
        leg: Leg::Buyer,
        user_id: buyer_id,
        delta: -price,
    });

    let mut seller_share = price.checked_mul(OWNER_FEE_RATIO).ok_or_else(overflow)?;

    if !creator_ids.is_empty() {
        let count = Decimal::from(creator_ids.len());
        let pool = price.checked_mul(COCREATOR_FEE_RATIO).ok_or_else(overflow)?;
        let fee = pool
            .checked_div(count)
            .ok_or_else(overflow)?
            .round_dp_with_strategy(FEE_SCALE, RoundingStrategy::ToZero);
        let remainder = pool - fee * count;
        seller_share = seller_share.checked_add(remainder).ok_or_else(overflow)?;
        plan.extend(creator_ids.iter().map(|&user_id| PlannedMovement {
            leg: Leg::CoCreator,
            user_id,
            delta: fee,
        }));
    }

    plan.push(PlannedMovement {
        leg: Leg::Seller,
        user_id: seller_id,
        delta: seller_share,
    });
    Ok(plan)
}

/// Latest `final_amount` for the user, zero when they have no movement.
pub fn current_balance(conn: &Connection, user_id: i64) -> Result<Decimal> {
    Ok(balances::latest_for_user(conn, user_id)?
        .map(|m| m.final_amount)
        .unwrap_or(Decimal::ZERO))
}

fn stage(
    conn: &Connection,
    ctx: &Context,
    transaction_id: Option<i64>,
    planned: &PlannedMovement,
) -> Result<BalanceMovement> {
    let initial = current_balance(conn, planned.user_id)?;
    let final_amount = initial
        .checked_add(planned.delta)
        .ok_or_else(|| MarketError::bad_request("Balance is too large"))?;

    if final_amount < Decimal::ZERO {
        return Err(match planned.leg {
            Leg::Buyer => MarketError::bad_request("Buyer cannot have negative balance"),
            _ => MarketError::bad_request(format!(
                "User {} cannot have negative balance",
                planned.user_id
            )),
        });
    }

    debug!(
        user_id = planned.user_id,
        ?transaction_id,
        leg = ?planned.leg,
        %initial,
        %final_amount,
        "staging balance movement"
    );
    balances::create(conn, ctx, planned.user_id, transaction_id, initial, final_amount)
}

/// Stage every movement of `transaction` on `conn`.
///
/// Movements are applied one at a time so each reads the balance left by the
/// previous one (a buyer who is also a co-creator is debited, then credited).
/// The first rejection returns immediately; the caller owns the rollback.
pub fn apply_trade_ledger(
    conn: &Connection,
    ctx: &Context,
    transaction: &Transaction,
    creators: &[User],
) -> Result<Vec<BalanceMovement>> {
    let creator_ids: Vec<i64> = creators.iter().map(|u| u.id).collect();
    let plan = plan_trade(
        transaction.buyer_id,
        transaction.seller_id,
        transaction.price,
        &creator_ids,
    )?;

    let mut movements = Vec::with_capacity(plan.len());
    for planned in &plan {
        movements.push(stage(conn, ctx, Some(transaction.id), planned)?);
    }
    Ok(movements)
}

/// Credit `amount` with no originating transaction (opening balance).
pub fn open_balance(
    conn: &Connection,
    ctx: &Context,
    user_id: i64,
    amount: Decimal,
) -> Result<BalanceMovement> {
    if amount < Decimal::ZERO {
        return Err(MarketError::Validation(
            "opening balance cannot be negative".into(),
        ));
    }
    let planned = PlannedMovement {
        leg: Leg::Seller,
        user_id,
        delta: amount,
    };
    stage(conn, ctx, None, &planned)
}
