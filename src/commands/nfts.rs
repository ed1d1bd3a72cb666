// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context as _, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rusqlite::Connection;
use std::path::Path;

use super::page_from;
use crate::catalog;
use crate::context::Context;
use crate::mint::{self, MintRequest};
use crate::models::TransactionView;
use crate::storage::FileStore;
use crate::trade::{self, TradeKind, TradeRequest};
use crate::utils::{
    fmt_amount, fmt_datetime, maybe_print_json, parse_decimal, parse_id, pretty_table, required,
};

pub fn handle(
    conn: &mut Connection,
    store: &dyn FileStore,
    ctx: &Context,
    m: &clap::ArgMatches,
) -> Result<()> {
    match m.subcommand() {
        Some(("mint", sub)) => mint_cmd(conn, store, ctx, sub)?,
        Some(("list", sub)) => list(conn, store, sub)?,
        Some(("show", sub)) => show(conn, store, sub)?,
        Some(("history", sub)) => history(conn, sub)?,
        Some(("buy", sub)) => trade_cmd(conn, ctx, sub, TradeKind::Buy)?,
        Some(("sell", sub)) => trade_cmd(conn, ctx, sub, TradeKind::Sell)?,
        _ => {}
    }
    Ok(())
}

fn mint_cmd(
    conn: &mut Connection,
    store: &dyn FileStore,
    ctx: &Context,
    sub: &clap::ArgMatches,
) -> Result<()> {
    let path = Path::new(required(sub, "file")?);
    let bytes = std::fs::read(path).with_context(|| format!("Read {}", path.display()))?;
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let creators = sub
        .get_many::<String>("creator")
        .map(|vals| vals.cloned().collect())
        .unwrap_or_default();

    let req = MintRequest {
        description: required(sub, "description")?.to_string(),
        creators,
        filename,
        bytes,
    };
    let nft = mint::mint(conn, store, ctx, &req)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &nft)? {
        println!(
            "Minted NFT {} '{}' owned by {}",
            nft.id, nft.description, nft.owner.username
        );
    }
    Ok(())
}

fn usernames<'a>(names: impl Iterator<Item = &'a String>) -> String {
    names.map(String::as_str).collect::<Vec<_>>().join(", ")
}

fn list(conn: &Connection, store: &dyn FileStore, sub: &clap::ArgMatches) -> Result<()> {
    let data = catalog::list_assets(conn, store, page_from(sub)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|n| {
                vec![
                    n.id.to_string(),
                    fmt_datetime(&n.creation_date),
                    n.description.clone(),
                    n.owner.username.clone(),
                    usernames(n.creators.iter().map(|c| &c.username)),
                    n.file.filename.clone(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Created", "Description", "Owner", "Creators", "File"],
                rows
            )
        );
    }
    Ok(())
}

fn show(conn: &Connection, store: &dyn FileStore, sub: &clap::ArgMatches) -> Result<()> {
    let nft = catalog::get_asset(conn, store, parse_id(required(sub, "id")?)?)?;
    if let Some(out) = sub.get_one::<String>("out") {
        let bytes = STANDARD
            .decode(&nft.file.file)
            .context("Stored image is not valid base64")?;
        std::fs::write(out, bytes).with_context(|| format!("Write {}", out))?;
        println!("Wrote {} to {}", nft.file.filename, out);
    }
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &nft)? {
        let rows = vec![vec![
            nft.id.to_string(),
            fmt_datetime(&nft.creation_date),
            nft.description.clone(),
            nft.owner.username.clone(),
            usernames(nft.creators.iter().map(|c| &c.username)),
            nft.file.filename.clone(),
        ]];
        println!(
            "{}",
            pretty_table(
                &["ID", "Created", "Description", "Owner", "Creators", "File"],
                rows
            )
        );
    }
    Ok(())
}

pub(crate) fn print_transactions(data: &[TransactionView]) {
    let rows: Vec<Vec<String>> = data
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                fmt_datetime(&t.creation_date),
                t.nft_id.to_string(),
                t.buyer.username.clone(),
                t.seller.username.clone(),
                fmt_amount(&t.price),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["ID", "Date", "NFT", "Buyer", "Seller", "Price"], rows)
    );
}

fn history(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let data = catalog::asset_history(conn, parse_id(required(sub, "id")?)?)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        print_transactions(&data);
    }
    Ok(())
}

/// The acting user fills whichever side of the trade was not given.
fn trade_cmd(
    conn: &mut Connection,
    ctx: &Context,
    sub: &clap::ArgMatches,
    kind: TradeKind,
) -> Result<()> {
    let nft_id = parse_id(required(sub, "id")?)?;
    let side = |name: &str| {
        sub.get_one::<String>(name)
            .cloned()
            .unwrap_or_else(|| ctx.username.clone())
    };
    let req = TradeRequest {
        buyer: side("buyer"),
        seller: side("seller"),
        price: parse_decimal(required(sub, "price")?)?,
    };

    let receipt = trade::trade(conn, ctx, nft_id, &req, kind)?;
    let view = receipt.view();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &view)? {
        println!(
            "Transaction {}: {} bought NFT {} from {} for {}",
            view.id,
            view.buyer.username,
            view.nft_id,
            view.seller.username,
            fmt_amount(&view.price)
        );
    }
    Ok(())
}
