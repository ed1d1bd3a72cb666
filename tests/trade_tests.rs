// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use nftmarket::context::Context;
use nftmarket::error::MarketError;
use nftmarket::ledger::{self, current_balance};
use nftmarket::models::Asset;
use nftmarket::repo::{Page, assets, balances, files, transactions, users};
use nftmarket::storage::StoredFile;
use nftmarket::trade::{TradeKind, TradeRequest, trade};
use nftmarket::db;
use rusqlite::Connection;
use rust_decimal::Decimal;

fn setup() -> Connection {
    let mut conn = db::open_in_memory().unwrap();
    db::seed_initial_data(&mut conn).unwrap();
    conn
}

fn acting(username: &str) -> Context {
    let mut ctx = Context::default_context();
    ctx.impersonate(username);
    ctx
}

fn id_of(conn: &Connection, username: &str) -> i64 {
    users::get_by_username(conn, username).unwrap().id
}

fn balance_of(conn: &Connection, username: &str) -> Decimal {
    current_balance(conn, id_of(conn, username)).unwrap()
}

fn dec(n: i64) -> Decimal {
    Decimal::new(n, 0)
}

/// Asset owned by `owner` with the given co-creators, inserted directly.
fn asset(conn: &Connection, owner: &str, creators: &[&str]) -> Asset {
    let n: i64 = conn
        .query_row("SELECT COUNT(*) FROM asset_files", [], |r| r.get(0))
        .unwrap();
    let file = files::create(
        conn,
        &StoredFile {
            filename: format!("art-{}.png", n),
            hashed_name: format!("{:064}.png", n),
            thumbnail: format!("thumb-{:064}.png", n),
            created: true,
        },
    )
    .unwrap();
    let creator_ids: Vec<i64> = creators.iter().map(|c| id_of(conn, c)).collect();
    assets::create(
        conn,
        &acting(owner),
        id_of(conn, owner),
        "test asset",
        file.id,
        &creator_ids,
    )
    .unwrap()
}

fn request(buyer: &str, seller: &str, price: i64) -> TradeRequest {
    TradeRequest {
        buyer: buyer.to_string(),
        seller: seller.to_string(),
        price: dec(price),
    }
}

fn counts(conn: &Connection) -> (i64, i64) {
    let txs: i64 = conn
        .query_row("SELECT COUNT(*) FROM transactions", [], |r| r.get(0))
        .unwrap();
    let moves: i64 = conn
        .query_row("SELECT COUNT(*) FROM balance_movements", [], |r| r.get(0))
        .unwrap();
    (txs, moves)
}

#[test]
fn sell_without_creators_pays_seller_eighty_percent() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &[]);

    let receipt = trade(
        &mut conn,
        &acting("dummy-user-1"),
        nft.id,
        &request("dummy-user-2", "dummy-user-1", 10),
        TradeKind::Sell,
    )
    .unwrap();

    assert_eq!(balance_of(&conn, "dummy-user-2"), dec(90));
    assert_eq!(balance_of(&conn, "dummy-user-1"), dec(108));
    assert_eq!(receipt.movements.len(), 2);
    assert_eq!(
        balances::list_for_transaction(&conn, receipt.transaction.id)
            .unwrap()
            .len(),
        2
    );
    assert_eq!(
        assets::get_by_id(&conn, nft.id).unwrap().owner_id,
        id_of(&conn, "dummy-user-2")
    );
}

#[test]
fn single_creator_receives_twenty_percent() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &["dummy-user-3"]);

    trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-2", "dummy-user-1", 10),
        TradeKind::Buy,
    )
    .unwrap();

    assert_eq!(balance_of(&conn, "dummy-user-2"), dec(90));
    assert_eq!(balance_of(&conn, "dummy-user-3"), dec(102));
    assert_eq!(balance_of(&conn, "dummy-user-1"), dec(108));
}

#[test]
fn creator_fee_is_split_evenly() {
    let mut conn = setup();
    let root = Context::system();
    let low = users::create(&conn, &root, "low-balance").unwrap();
    ledger::open_balance(&conn, &root, low.id, dec(50)).unwrap();
    let nft = asset(&conn, "dummy-user-1", &["dummy-user-3", "low-balance"]);

    let receipt = trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-2", "dummy-user-1", 10),
        TradeKind::Buy,
    )
    .unwrap();

    assert_eq!(balance_of(&conn, "dummy-user-3"), dec(101));
    assert_eq!(balance_of(&conn, "low-balance"), dec(51));
    assert_eq!(balance_of(&conn, "dummy-user-1"), dec(108));
    assert_eq!(balance_of(&conn, "dummy-user-2"), dec(90));

    // buyer, creators in mint order, seller
    let order: Vec<i64> = receipt.movements.iter().map(|m| m.user_id).collect();
    assert_eq!(
        order,
        vec![
            id_of(&conn, "dummy-user-2"),
            id_of(&conn, "dummy-user-3"),
            low.id,
            id_of(&conn, "dummy-user-1")
        ]
    );
    let net: Decimal = receipt.movements.iter().map(|m| m.delta()).sum();
    assert!(net.is_zero());
}

#[test]
fn overdraft_rolls_back_everything() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &["dummy-user-3"]);
    let before = counts(&conn);

    let err = trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-2", "dummy-user-1", 200),
        TradeKind::Buy,
    )
    .unwrap_err();

    match err {
        MarketError::BadRequest(msg) => assert_eq!(msg, "Buyer cannot have negative balance"),
        other => panic!("unexpected error {:?}", other),
    }
    assert_eq!(counts(&conn), before);
    let unchanged = assets::get_by_id(&conn, nft.id).unwrap();
    assert_eq!(unchanged.owner_id, id_of(&conn, "dummy-user-1"));
    assert_eq!(unchanged.audit.version, 1);
    for u in ["dummy-user-1", "dummy-user-2", "dummy-user-3"] {
        assert_eq!(balance_of(&conn, u), dec(100));
    }
}

#[test]
fn owner_cannot_buy_own_asset() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &[]);
    let before = counts(&conn);

    let err = trade(
        &mut conn,
        &acting("dummy-user-1"),
        nft.id,
        &request("dummy-user-1", "dummy-user-1", 10),
        TradeKind::Buy,
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "User dummy-user-1 cannot buy requested NFT");
    assert_eq!(err.status(), 400);
    assert_eq!(counts(&conn), before);
}

#[test]
fn buy_as_someone_else_is_rejected() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &[]);

    let err = trade(
        &mut conn,
        &acting("dummy-user-4"),
        nft.id,
        &request("dummy-user-2", "dummy-user-1", 10),
        TradeKind::Buy,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Either Buyer or Seller is invalid");

    // seller who is not the owner fails the same way
    let err = trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-2", "dummy-user-3", 10),
        TradeKind::Buy,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Either Buyer or Seller is invalid");
}

#[test]
fn sell_flow_checks_identity_and_ownership() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &[]);

    let err = trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-3", "dummy-user-1", 10),
        TradeKind::Sell,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Seller is invalid");

    let err = trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-3", "dummy-user-2", 10),
        TradeKind::Sell,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "User dummy-user-2 cannot sell requested NFT");

    let err = trade(
        &mut conn,
        &acting("dummy-user-1"),
        nft.id,
        &request("dummy-user-1", "dummy-user-1", 10),
        TradeKind::Sell,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Buyer and Seller must be different users");
}

#[test]
fn unknown_parties_and_assets_are_not_found() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &[]);

    let err = trade(
        &mut conn,
        &acting("ghost"),
        nft.id,
        &request("ghost", "dummy-user-1", 10),
        TradeKind::Buy,
    )
    .unwrap_err();
    assert_eq!(err.status(), 404);
    let extra = err.extra().unwrap();
    assert_eq!(extra.model, "User");
    assert_eq!(extra.value, "ghost");

    let err = trade(
        &mut conn,
        &acting("dummy-user-2"),
        9999,
        &request("dummy-user-2", "dummy-user-1", 10),
        TradeKind::Buy,
    )
    .unwrap_err();
    assert!(matches!(err, MarketError::NotFound(ref e) if e.model == "NFT"));
}

#[test]
fn negative_price_is_a_validation_error() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &[]);
    let err = trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-2", "dummy-user-1", -5),
        TradeKind::Buy,
    )
    .unwrap_err();
    assert_eq!(err.status(), 422);
}

#[test]
fn stale_owner_is_a_conflict() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &[]);

    // another request moves the asset after `nft` was read
    assets::reassign_owner(
        &conn,
        &acting("dummy-user-1"),
        &nft,
        id_of(&conn, "dummy-user-3"),
    )
    .unwrap();

    let err = assets::reassign_owner(
        &conn,
        &acting("dummy-user-1"),
        &nft,
        id_of(&conn, "dummy-user-2"),
    )
    .unwrap_err();
    assert_eq!(err.status(), 409);
    assert!(matches!(err, MarketError::Conflict(ref e) if e.model == "NFT"));
    assert_eq!(err.code(), "conflict");

    // a fresh trade validates against the current owner
    let err = trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-2", "dummy-user-1", 10),
        TradeKind::Buy,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Either Buyer or Seller is invalid");
}

#[test]
fn resale_pays_creators_again_and_records_history() {
    let mut conn = setup();
    let nft = asset(&conn, "dummy-user-1", &["dummy-user-5"]);

    trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-2", "dummy-user-1", 10),
        TradeKind::Buy,
    )
    .unwrap();
    let second = trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-3", "dummy-user-2", 20),
        TradeKind::Sell,
    )
    .unwrap();

    assert_eq!(balance_of(&conn, "dummy-user-5"), dec(106));
    assert_eq!(balance_of(&conn, "dummy-user-2"), dec(106));
    assert_eq!(balance_of(&conn, "dummy-user-3"), dec(80));
    assert_eq!(
        assets::get_by_id(&conn, nft.id).unwrap().audit.version,
        3
    );

    let history = transactions::list_for_asset(&conn, nft.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, second.transaction.id);

    // reading twice gives the same rows
    let user = id_of(&conn, "dummy-user-2");
    let a = balances::list_for_user(&conn, user, Page::default()).unwrap();
    let b = balances::list_for_user(&conn, user, Page::default()).unwrap();
    assert_eq!(a, b);
}

#[test]
fn three_way_creator_split_conserves_funds() {
    let mut conn = setup();
    let nft = asset(
        &conn,
        "dummy-user-1",
        &["dummy-user-3", "dummy-user-4", "dummy-user-5"],
    );

    let receipt = trade(
        &mut conn,
        &acting("dummy-user-2"),
        nft.id,
        &request("dummy-user-2", "dummy-user-1", 10),
        TradeKind::Buy,
    )
    .unwrap();

    let share: Decimal = "100.66666666".parse().unwrap();
    for u in ["dummy-user-3", "dummy-user-4", "dummy-user-5"] {
        assert_eq!(balance_of(&conn, u), share);
    }
    assert_eq!(
        balance_of(&conn, "dummy-user-1"),
        "108.00000002".parse::<Decimal>().unwrap()
    );
    assert_eq!(balance_of(&conn, "dummy-user-2"), dec(90));

    let net: Decimal = receipt.movements.iter().map(|m| m.delta()).sum();
    assert!(net.is_zero());
}
