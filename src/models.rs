// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::context::Context;

/// Columns stamped on every row from the acting identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audit {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub modified_by: String,
    pub modified_at: DateTime<Utc>,
    pub version: i64,
}

impl Audit {
    /// Restamp for an update; `version` goes up by one.
    pub fn touch(&mut self, ctx: &Context) {
        self.modified_by = ctx.username.clone();
        self.modified_at = ctx.system_date;
        self.version += 1;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub date_joined: NaiveDate,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetFile {
    pub id: i64,
    pub filename: String,
    pub hashed_name: String,
    pub thumbnail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub id: i64,
    pub description: String,
    pub file_id: i64,
    pub owner_id: i64,
    pub creation_date: DateTime<Utc>,
    #[serde(flatten)]
    pub audit: Audit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub asset_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    pub price: Decimal,
    pub creation_date: DateTime<Utc>,
    #[serde(flatten)]
    pub audit: Audit,
}

/// One append-only ledger entry. The newest entry's `final_amount` is the
/// user's balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceMovement {
    pub id: i64,
    pub user_id: i64,
    pub transaction_id: Option<i64>,
    pub initial_amount: Decimal,
    pub final_amount: Decimal,
    pub creation_date: DateTime<Utc>,
    #[serde(flatten)]
    pub audit: Audit,
}

impl BalanceMovement {
    pub fn delta(&self) -> Decimal {
        self.final_amount - self.initial_amount
    }
}

// Response shapes

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub date_joined: NaiveDate,
}

impl From<&User> for UserView {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            date_joined: u.date_joined,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThumbnailView {
    pub filename: String,
    /// base64 of the thumbnail bytes
    pub thumbnail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileView {
    pub filename: String,
    /// base64 of the original bytes
    pub file: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSummary {
    pub id: i64,
    pub creation_date: DateTime<Utc>,
    pub description: String,
    pub owner: UserView,
    pub creators: Vec<UserView>,
    pub file: ThumbnailView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetDetail {
    pub id: i64,
    pub creation_date: DateTime<Utc>,
    pub description: String,
    pub owner: UserView,
    pub creators: Vec<UserView>,
    pub file: FileView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionView {
    pub id: i64,
    pub creation_date: DateTime<Utc>,
    pub nft_id: i64,
    pub buyer: UserView,
    pub seller: UserView,
    pub price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceView {
    pub id: i64,
    pub creation_date: DateTime<Utc>,
    pub user: UserView,
    pub transaction_id: Option<i64>,
    pub initial_amount: Decimal,
    pub final_amount: Decimal,
}
