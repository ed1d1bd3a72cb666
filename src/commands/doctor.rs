// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::collections::HashMap;

use crate::repo::{assets, balances, transactions};
use crate::utils::pretty_table;

/// One inconsistency: a short machine-friendly kind plus a human detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: &'static str,
    pub detail: String,
}

impl Issue {
    fn new(kind: &'static str, detail: String) -> Self {
        Self { kind, detail }
    }
}

pub fn handle(conn: &Connection) -> Result<()> {
    let issues = diagnose(conn)?;
    if issues.is_empty() {
        println!("✅ doctor: no issues found");
    } else {
        let rows = issues
            .into_iter()
            .map(|i| vec![i.kind.to_string(), i.detail])
            .collect();
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

pub fn diagnose(conn: &Connection) -> Result<Vec<Issue>> {
    let mut issues = Vec::new();

    // 1) Each movement continues the previous final amount of its user
    let movements = balances::all(conn)?;
    let mut last: HashMap<i64, Decimal> = HashMap::new();
    let mut per_txn: HashMap<i64, usize> = HashMap::new();
    for m in &movements {
        let expected = last.get(&m.user_id).copied().unwrap_or(Decimal::ZERO);
        if m.initial_amount != expected {
            issues.push(Issue::new(
                "balance_chain_break",
                format!(
                    "movement {} of user {} starts at {} but previous final is {}",
                    m.id, m.user_id, m.initial_amount, expected
                ),
            ));
        }
        if m.final_amount < Decimal::ZERO {
            issues.push(Issue::new(
                "negative_balance",
                format!("movement {} leaves user {} at {}", m.id, m.user_id, m.final_amount),
            ));
        }
        last.insert(m.user_id, m.final_amount);
        if let Some(t) = m.transaction_id {
            *per_txn.entry(t).or_default() += 1;
        }
    }

    // 2) Every trade has buyer + seller + one movement per co-creator
    let trades = transactions::all(conn)?;
    let mut creator_counts: HashMap<i64, usize> = HashMap::new();
    let mut latest_buyer: HashMap<i64, i64> = HashMap::new();
    for t in &trades {
        let creators = match creator_counts.get(&t.asset_id) {
            Some(n) => *n,
            None => {
                let n = assets::creators_of(conn, t.asset_id)?.len();
                creator_counts.insert(t.asset_id, n);
                n
            }
        };
        let found = per_txn.get(&t.id).copied().unwrap_or(0);
        if found != creators + 2 {
            issues.push(Issue::new(
                "movement_count",
                format!(
                    "transaction {} has {} movements, expected {}",
                    t.id,
                    found,
                    creators + 2
                ),
            ));
        }
        // trades come oldest first
        latest_buyer.insert(t.asset_id, t.buyer_id);
    }

    // 3) Owner of a traded asset is the buyer of its latest trade
    for (asset_id, buyer_id) in latest_buyer {
        let asset = assets::get_by_id(conn, asset_id)?;
        if asset.owner_id != buyer_id {
            issues.push(Issue::new(
                "owner_mismatch",
                format!(
                    "NFT {} is owned by user {} but was last bought by user {}",
                    asset_id, asset.owner_id, buyer_id
                ),
            ));
        }
    }

    issues.sort_by(|a, b| a.kind.cmp(b.kind).then_with(|| a.detail.cmp(&b.detail)));
    Ok(issues)
}
