// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};
use rusqlite::Connection;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;

use crate::repo::{balances, transactions};
use crate::utils::required;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let (what, sub) = match m.subcommand() {
        Some(pair) => pair,
        None => return Ok(()),
    };
    let fmt = required(sub, "format")?.to_lowercase();
    let out = required(sub, "out")?;
    let n = match what {
        "transactions" => export_transactions(conn, &fmt, Path::new(out))?,
        "balances" => export_balances(conn, &fmt, Path::new(out))?,
        _ => return Ok(()),
    };
    println!("Exported {} {} to {}", n, what, out);
    Ok(())
}

fn usernames(conn: &Connection) -> Result<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, username FROM users")?;
    let rows = stmt.query_map([], |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?)))?;
    let mut out = HashMap::new();
    for row in rows {
        let (id, name) = row?;
        out.insert(id, name);
    }
    Ok(out)
}

fn name_of(names: &HashMap<i64, String>, id: i64) -> String {
    names.get(&id).cloned().unwrap_or_else(|| id.to_string())
}

/// Write every trade, oldest first. Returns the number of rows written.
pub fn export_transactions(conn: &Connection, fmt: &str, out: &Path) -> Result<usize> {
    let names = usernames(conn)?;
    let rows = transactions::all(conn)?;

    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record(["id", "date", "nft_id", "buyer", "seller", "price"])?;
            for t in &rows {
                wtr.write_record([
                    t.id.to_string(),
                    t.creation_date.to_rfc3339(),
                    t.asset_id.to_string(),
                    name_of(&names, t.buyer_id),
                    name_of(&names, t.seller_id),
                    t.price.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = rows
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id, "date": t.creation_date, "nft_id": t.asset_id,
                        "buyer": name_of(&names, t.buyer_id), "seller": name_of(&names, t.seller_id),
                        "price": t.price
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    Ok(rows.len())
}

/// Write the whole balance ledger, oldest first.
pub fn export_balances(conn: &Connection, fmt: &str, out: &Path) -> Result<usize> {
    let names = usernames(conn)?;
    let rows = balances::all(conn)?;

    match fmt {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)?;
            wtr.write_record([
                "id",
                "date",
                "user",
                "transaction_id",
                "initial_amount",
                "final_amount",
            ])?;
            for b in &rows {
                wtr.write_record([
                    b.id.to_string(),
                    b.creation_date.to_rfc3339(),
                    name_of(&names, b.user_id),
                    b.transaction_id.map(|t| t.to_string()).unwrap_or_default(),
                    b.initial_amount.to_string(),
                    b.final_amount.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = rows
                .iter()
                .map(|b| {
                    json!({
                        "id": b.id, "date": b.creation_date, "user": name_of(&names, b.user_id),
                        "transaction_id": b.transaction_id,
                        "initial_amount": b.initial_amount, "final_amount": b.final_amount
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    Ok(rows.len())
}
