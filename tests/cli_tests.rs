// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use nftmarket::commands::{doctor, exporter, users as user_cmd};
use nftmarket::context::Context;
use nftmarket::models::Asset;
use nftmarket::repo::{assets, files, users};
use nftmarket::storage::StoredFile;
use nftmarket::trade::{TradeKind, TradeRequest, trade};
use nftmarket::{cli, db, ledger};
use rusqlite::{Connection, params};
use rust_decimal::Decimal;
use serde_json::Value;
use tempfile::tempdir;

fn setup() -> Connection {
    let mut conn = db::open_in_memory().unwrap();
    db::seed_initial_data(&mut conn).unwrap();
    conn
}

fn as_user(name: &str) -> Context {
    let mut ctx = Context::default_context();
    ctx.impersonate(name);
    ctx
}

fn listed_asset(conn: &Connection, owner: &str, creators: &[&str]) -> Asset {
    let file = files::create(
        conn,
        &StoredFile {
            filename: "piece.png".into(),
            hashed_name: "abc.png".into(),
            thumbnail: "thumb-abc.png".into(),
            created: true,
        },
    )
    .unwrap();
    let owner_id = users::get_by_username(conn, owner).unwrap().id;
    let ids: Vec<i64> = creators
        .iter()
        .map(|c| users::get_by_username(conn, c).unwrap().id)
        .collect();
    assets::create(conn, &as_user(owner), owner_id, "piece", file.id, &ids).unwrap()
}

fn traded() -> (Connection, Asset) {
    let mut conn = setup();
    let nft = listed_asset(&conn, "dummy-user-1", &["dummy-user-3"]);
    trade(
        &mut conn,
        &as_user("dummy-user-2"),
        nft.id,
        &TradeRequest {
            buyer: "dummy-user-2".into(),
            seller: "dummy-user-1".into(),
            price: Decimal::new(25, 0),
        },
        TradeKind::Buy,
    )
    .unwrap();
    (conn, nft)
}

#[test]
fn user_add_opens_balance() {
    let mut conn = setup();
    let matches = cli::build_cli().get_matches_from([
        "nftmarket", "user", "add", "--username", "collector", "--balance", "42.5",
    ]);
    if let Some(("user", sub)) = matches.subcommand() {
        user_cmd::handle(&mut conn, &Context::system(), sub).unwrap();
    } else {
        panic!("no user subcommand");
    }
    let u = users::get_by_username(&conn, "collector").unwrap();
    assert_eq!(
        ledger::current_balance(&conn, u.id).unwrap(),
        Decimal::new(425, 1)
    );
}

#[test]
fn register_is_atomic() {
    let mut conn = setup();
    let err = user_cmd::register(&mut conn, &Context::system(), "broke", Decimal::new(-1, 0));
    assert!(err.is_err());
    assert!(users::find_by_username(&conn, "broke").unwrap().is_none());
}

#[test]
fn list_limit_is_bounded_by_the_parser() {
    let res = cli::build_cli().try_get_matches_from(["nftmarket", "tx", "list", "--limit", "51"]);
    assert!(res.is_err());
}

#[test]
fn export_transactions_csv() {
    let (conn, nft) = traded();
    let dir = tempdir().unwrap();
    let out = dir.path().join("trades.csv");
    let out_str = out.to_string_lossy().to_string();

    let matches = cli::build_cli().get_matches_from([
        "nftmarket", "export", "transactions", "--format", "csv", "--out", out_str.as_str(),
    ]);
    if let Some(("export", sub)) = matches.subcommand() {
        exporter::handle(&conn, sub).unwrap();
    } else {
        panic!("no export subcommand");
    }

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(
        headers.iter().collect::<Vec<_>>(),
        vec!["id", "date", "nft_id", "buyer", "seller", "price"]
    );
    let rows: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 1);
    assert_eq!(&rows[0][2], nft.id.to_string());
    assert_eq!(&rows[0][3], "dummy-user-2");
    assert_eq!(&rows[0][4], "dummy-user-1");
    assert_eq!(&rows[0][5], "25");
}

#[test]
fn export_balances_json() {
    let (conn, _) = traded();
    let dir = tempdir().unwrap();
    let out = dir.path().join("ledger.json");

    let n = exporter::export_balances(&conn, "json", &out).unwrap();
    // six opening balances plus buyer, creator and seller legs
    assert_eq!(n, 9);

    let parsed: Value = serde_json::from_str(&std::fs::read_to_string(&out).unwrap()).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 9);
    let last = &items[8];
    assert_eq!(last["user"], "dummy-user-1");
    assert_eq!(last["transaction_id"], 1);

    assert!(exporter::export_balances(&conn, "xml", &out).is_err());
}

#[test]
fn doctor_is_clean_after_trades() {
    let (conn, _) = traded();
    assert!(doctor::diagnose(&conn).unwrap().is_empty());
}

#[test]
fn doctor_flags_tampered_ledger() {
    let (conn, nft) = traded();
    let ctx = Context::system();
    let buyer = users::get_by_username(&conn, "dummy-user-2").unwrap();

    // movement that does not continue the chain and goes negative
    conn.execute(
        "INSERT INTO balance_movements(user_id, transaction_id, initial_amount, final_amount, creation_date, created_by, created_at, modified_by, modified_at, version)
         VALUES (?1, 1, '10', '-5', ?2, 'root', ?2, 'root', ?2, 1)",
        params![buyer.id, ctx.system_date],
    )
    .unwrap();
    // owner no longer matches the last buyer
    conn.execute(
        "UPDATE assets SET owner_id=?1 WHERE id=?2",
        params![users::get_by_username(&conn, "dummy-user-5").unwrap().id, nft.id],
    )
    .unwrap();

    let kinds: Vec<&str> = doctor::diagnose(&conn)
        .unwrap()
        .iter()
        .map(|i| i.kind)
        .collect();
    assert_eq!(
        kinds,
        vec![
            "balance_chain_break",
            "movement_count",
            "negative_balance",
            "owner_mismatch"
        ]
    );
}
