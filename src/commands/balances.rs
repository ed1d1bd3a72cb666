// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use serde_json::json;

use super::page_from;
use crate::catalog;
use crate::context::Context;
use crate::repo::users;
use crate::utils::{fmt_amount, fmt_datetime, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("history", sub)) => history(conn, sub)?,
        Some(("show", sub)) => show(conn, ctx, sub)?,
        _ => {}
    }
    Ok(())
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let page = page_from(sub)?;
    let data = match sub.get_one::<String>("user") {
        Some(name) => {
            let user = users::get_by_username(conn, name)?;
            catalog::user_balance_history(conn, user.id, page)?
        }
        None => catalog::balance_history(conn, page)?,
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    fmt_datetime(&b.creation_date),
                    b.user.username.clone(),
                    b.transaction_id.map(|t| t.to_string()).unwrap_or_default(),
                    fmt_amount(&b.initial_amount),
                    fmt_amount(&b.final_amount),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Date", "User", "Txn", "Initial", "Final"], rows)
        );
    }
    Ok(())
}

fn show(conn: &Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let username = sub
        .get_one::<String>("user")
        .map(String::as_str)
        .unwrap_or(ctx.username.as_str());
    let (user, balance) = catalog::current_balance(conn, username)?;
    let payload = json!({ "user": user, "balance": balance });
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &payload)? {
        println!("{}: {}", user.username, fmt_amount(&balance));
    }
    Ok(())
}
