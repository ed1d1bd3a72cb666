// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context as _, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::{Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::context::Context;
use crate::{ledger, repo};

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Nftmarket", "nftmarket"));

/// Users created on first start, each opened with `SEED_BALANCE`.
pub const SEED_USERS: [&str; 6] = [
    "default-user",
    "dummy-user-1",
    "dummy-user-2",
    "dummy-user-3",
    "dummy-user-4",
    "dummy-user-5",
];
pub const SEED_BALANCE: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

pub fn data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.to_path_buf())
}

pub fn db_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("nftmarket.sqlite"))
}

pub fn open_or_init() -> Result<Connection> {
    open_at(&db_path()?)
}

pub fn open_at(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Create DB dir {}", parent.display()))?;
    }
    let mut conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&mut conn)?;
    seed_initial_data(&mut conn)?;
    Ok(conn)
}

/// Fresh schema without seed rows. Used by tests and tooling.
pub fn open_in_memory() -> Result<Connection> {
    let mut conn = Connection::open_in_memory()?;
    init_schema(&mut conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        date_joined TEXT NOT NULL,
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL,
        modified_by TEXT NOT NULL,
        modified_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS asset_files(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        filename TEXT NOT NULL,
        hashed_name TEXT NOT NULL,
        thumbnail TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS assets(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT NOT NULL CHECK(length(description) <= 500),
        file_id INTEGER NOT NULL UNIQUE,
        owner_id INTEGER NOT NULL,
        creation_date TEXT NOT NULL,
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL,
        modified_by TEXT NOT NULL,
        modified_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY(file_id) REFERENCES asset_files(id),
        FOREIGN KEY(owner_id) REFERENCES users(id)
    );
    CREATE INDEX IF NOT EXISTS idx_assets_creation ON assets(creation_date);

    -- position keeps the co-creators in the order they were given at mint
    CREATE TABLE IF NOT EXISTS asset_creators(
        asset_id INTEGER NOT NULL,
        creator_id INTEGER NOT NULL,
        position INTEGER NOT NULL,
        PRIMARY KEY(asset_id, creator_id),
        FOREIGN KEY(asset_id) REFERENCES assets(id),
        FOREIGN KEY(creator_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        asset_id INTEGER NOT NULL,
        buyer_id INTEGER NOT NULL,
        seller_id INTEGER NOT NULL,
        price TEXT NOT NULL,
        creation_date TEXT NOT NULL,
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL,
        modified_by TEXT NOT NULL,
        modified_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY(asset_id) REFERENCES assets(id),
        FOREIGN KEY(buyer_id) REFERENCES users(id),
        FOREIGN KEY(seller_id) REFERENCES users(id)
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_creation ON transactions(creation_date);

    CREATE TABLE IF NOT EXISTS balance_movements(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        transaction_id INTEGER,
        initial_amount TEXT NOT NULL,
        final_amount TEXT NOT NULL,
        creation_date TEXT NOT NULL,
        created_by TEXT NOT NULL,
        created_at TEXT NOT NULL,
        modified_by TEXT NOT NULL,
        modified_at TEXT NOT NULL,
        version INTEGER NOT NULL DEFAULT 1,
        FOREIGN KEY(user_id) REFERENCES users(id),
        FOREIGN KEY(transaction_id) REFERENCES transactions(id)
    );
    CREATE INDEX IF NOT EXISTS idx_balance_user ON balance_movements(user_id, id);
    "#,
    )?;
    Ok(())
}

/// Seed the default users and their opening balances when the tables are empty.
pub fn seed_initial_data(conn: &mut Connection) -> Result<()> {
    let ctx = Context::system();
    let tx = conn.transaction()?;

    let any_user: Option<i64> = tx
        .query_row("SELECT id FROM users LIMIT 1", [], |r| r.get(0))
        .optional()?;
    if any_user.is_some() {
        info!("Users already initialized");
    } else {
        info!("Initializing table users");
        for username in SEED_USERS {
            repo::users::create(&tx, &ctx, username)
                .with_context(|| format!("Seed user '{}'", username))?;
        }
    }

    let any_movement: Option<i64> = tx
        .query_row("SELECT id FROM balance_movements LIMIT 1", [], |r| r.get(0))
        .optional()?;
    if any_movement.is_some() {
        info!("Balances already initialized");
    } else {
        info!("Initializing table balance_movements");
        for username in SEED_USERS {
            if let Some(user) = repo::users::find_by_username(&tx, username)? {
                ledger::open_balance(&tx, &ctx, user.id, SEED_BALANCE)?;
            }
        }
    }

    tx.commit()?;
    Ok(())
}
