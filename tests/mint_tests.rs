// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use nftmarket::catalog;
use nftmarket::context::Context;
use nftmarket::db;
use nftmarket::error::MarketError;
use nftmarket::mint::{MintRequest, mint};
use nftmarket::repo::{Page, assets};
use nftmarket::storage::{FileStore, LocalFileStore};
use rusqlite::Connection;
use std::io::Cursor;
use tempfile::{TempDir, tempdir};

fn setup() -> (Connection, LocalFileStore, TempDir) {
    let mut conn = db::open_in_memory().unwrap();
    db::seed_initial_data(&mut conn).unwrap();
    let dir = tempdir().unwrap();
    let store = LocalFileStore::new(dir.path().join("images")).unwrap();
    (conn, store, dir)
}

fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([shade, 64, 128]));
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .unwrap();
    buf
}

fn request(filename: &str, bytes: Vec<u8>, creators: &[&str]) -> MintRequest {
    MintRequest {
        description: "sunset over the bay".to_string(),
        creators: creators.iter().map(|c| c.to_string()).collect(),
        filename: filename.to_string(),
        bytes,
    }
}

fn stored_files(store: &LocalFileStore) -> usize {
    std::fs::read_dir(store.root()).unwrap().count()
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

fn as_user(name: &str) -> Context {
    let mut ctx = Context::default_context();
    ctx.impersonate(name);
    ctx
}

#[test]
fn mint_stores_file_thumbnail_and_links_creators() {
    let (mut conn, store, _dir) = setup();
    let bytes = png(640, 320, 10);

    let nft = mint(
        &mut conn,
        &store,
        &as_user("dummy-user-1"),
        &request("Sunset.PNG", bytes.clone(), &["dummy-user-3", "dummy-user-2"]),
    )
    .unwrap();

    assert_eq!(nft.owner.username, "dummy-user-1");
    let creators: Vec<_> = nft.creators.iter().map(|c| c.username.as_str()).collect();
    assert_eq!(creators, vec!["dummy-user-3", "dummy-user-2"]);
    assert_eq!(nft.file.filename, "Sunset.PNG");
    assert_eq!(STANDARD.decode(&nft.file.file).unwrap(), bytes);
    assert_eq!(stored_files(&store), 2);

    let stored = assets::creators_of(&conn, nft.id).unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].username, "dummy-user-3");

    let listed = catalog::list_assets(&conn, &store, Page::default()).unwrap();
    assert_eq!(listed.len(), 1);
    let thumb = STANDARD.decode(&listed[0].file.thumbnail).unwrap();
    let decoded = image::load_from_memory(&thumb).unwrap();
    assert_eq!(decoded.dimensions(), (200, 100));

    let detail = catalog::get_asset(&conn, &store, nft.id).unwrap();
    assert_eq!(detail.file.file, nft.file.file);
}

#[test]
fn small_images_are_not_upscaled() {
    let (mut conn, store, _dir) = setup();
    let nft = mint(
        &mut conn,
        &store,
        &Context::default_context(),
        &request("tiny.png", png(32, 16, 1), &[]),
    )
    .unwrap();
    let listed = catalog::list_assets(&conn, &store, Page::default()).unwrap();
    assert_eq!(listed[0].id, nft.id);
    let thumb = STANDARD.decode(&listed[0].file.thumbnail).unwrap();
    assert_eq!(image::load_from_memory(&thumb).unwrap().dimensions(), (32, 16));
}

#[test]
fn rejected_extension_writes_nothing() {
    let (mut conn, store, _dir) = setup();
    let err = mint(
        &mut conn,
        &store,
        &Context::default_context(),
        &request("notes.gif", png(10, 10, 2), &[]),
    )
    .unwrap_err();
    assert!(matches!(err, MarketError::BadRequest(ref m) if m == "File extension not allowed"));
    assert_eq!(stored_files(&store), 0);
    assert_eq!(count(&conn, "assets"), 0);
}

#[test]
fn unknown_creator_or_owner_is_not_found() {
    let (mut conn, store, _dir) = setup();
    let err = mint(
        &mut conn,
        &store,
        &Context::default_context(),
        &request("a.png", png(10, 10, 3), &["nobody"]),
    )
    .unwrap_err();
    assert_eq!(err.status(), 404);

    let err = mint(
        &mut conn,
        &store,
        &as_user("ghost"),
        &request("a.png", png(10, 10, 3), &[]),
    )
    .unwrap_err();
    assert_eq!(err.status(), 404);
    assert_eq!(stored_files(&store), 0);
}

#[test]
fn duplicate_creator_is_rejected() {
    let (mut conn, store, _dir) = setup();
    let err = mint(
        &mut conn,
        &store,
        &Context::default_context(),
        &request("a.png", png(10, 10, 4), &["dummy-user-1", "dummy-user-1"]),
    )
    .unwrap_err();
    assert_eq!(err.status(), 400);
}

#[test]
fn long_description_is_a_validation_error() {
    let (mut conn, store, _dir) = setup();
    let mut req = request("a.png", png(10, 10, 5), &[]);
    req.description = "x".repeat(501);
    let err = mint(&mut conn, &store, &Context::default_context(), &req).unwrap_err();
    assert_eq!(err.status(), 422);
    assert_eq!(stored_files(&store), 0);
}

#[test]
fn failed_insert_removes_stored_files() {
    let (mut conn, store, _dir) = setup();
    conn.execute_batch(
        "CREATE TRIGGER refuse_assets BEFORE INSERT ON assets
         BEGIN SELECT RAISE(ABORT, 'refused'); END;",
    )
    .unwrap();

    let err = mint(
        &mut conn,
        &store,
        &Context::default_context(),
        &request("a.png", png(50, 50, 6), &["dummy-user-2"]),
    )
    .unwrap_err();

    assert!(err.is_internal());
    assert_eq!(err.to_string(), "Error trying to mint NFT");
    assert_eq!(stored_files(&store), 0);
    assert_eq!(count(&conn, "asset_files"), 0);
    assert_eq!(count(&conn, "asset_creators"), 0);
}

#[test]
fn identical_content_is_shared_and_survives_a_failed_mint() {
    let (mut conn, store, _dir) = setup();
    let bytes = png(20, 20, 7);
    let first = mint(
        &mut conn,
        &store,
        &Context::default_context(),
        &request("one.png", bytes.clone(), &[]),
    )
    .unwrap();

    conn.execute_batch(
        "CREATE TRIGGER refuse_assets BEFORE INSERT ON assets
         BEGIN SELECT RAISE(ABORT, 'refused'); END;",
    )
    .unwrap();
    assert!(mint(
        &mut conn,
        &store,
        &Context::default_context(),
        &request("two.png", bytes, &[]),
    )
    .is_err());

    assert_eq!(stored_files(&store), 2);
    assert!(catalog::get_asset(&conn, &store, first.id).is_ok());
}

#[test]
fn store_read_rejects_path_escapes() {
    let (_conn, store, _dir) = setup();
    assert!(store.read("../secret.png").is_err());
    assert!(store.read("").is_err());
}
