// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::Decimal;

use super::page_from;
use crate::catalog;
use crate::context::Context;
use crate::ledger;
use crate::models::UserView;
use crate::repo::users;
use crate::utils::{fmt_amount, maybe_print_json, parse_decimal, parse_id, pretty_table, required};

pub fn handle(conn: &mut Connection, ctx: &Context, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, ctx, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Register `username` with an opening balance in one transaction.
pub fn register(
    conn: &mut Connection,
    ctx: &Context,
    username: &str,
    opening: Decimal,
) -> Result<UserView> {
    let tx = conn.transaction()?;
    let user = users::create(&tx, ctx, username)?;
    ledger::open_balance(&tx, ctx, user.id, opening)?;
    tx.commit()?;
    Ok(UserView::from(&user))
}

fn add(conn: &mut Connection, ctx: &Context, sub: &clap::ArgMatches) -> Result<()> {
    let username = required(sub, "username")?;
    let opening = match sub.get_one::<String>("balance") {
        Some(s) => parse_decimal(s)?,
        None => Decimal::ZERO,
    };
    let user = register(conn, ctx, username, opening)?;
    println!(
        "Added user '{}' (id {}) with balance {}",
        user.username,
        user.id,
        fmt_amount(&opening)
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = catalog::list_users(conn, page_from(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|u| vec![u.id.to_string(), u.username.clone(), u.date_joined.to_string()])
            .collect();
        println!("{}", pretty_table(&["ID", "Username", "Joined"], rows));
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = catalog::get_user(conn, parse_id(required(sub, "id")?)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &user)? {
        let balance = ledger::current_balance(conn, user.id)?;
        let rows = vec![vec![
            user.id.to_string(),
            user.username.clone(),
            user.date_joined.to_string(),
            fmt_amount(&balance),
        ]];
        println!("{}", pretty_table(&["ID", "Username", "Joined", "Balance"], rows));
    }
    Ok(())
}
