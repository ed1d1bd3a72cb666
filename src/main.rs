// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use nftmarket::config::Settings;
use nftmarket::context::Context;
use nftmarket::storage::LocalFileStore;
use nftmarket::{api, cli, commands, db};

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    // the server logs requests; CLI output stays on stdout
    let serving = matches.subcommand_name() == Some("serve");
    init_tracing(if serving { "info" } else { "warn" });

    let mut settings = Settings::from_env()?;
    if let Some(path) = matches.get_one::<String>("db") {
        settings = settings.with_db_path(PathBuf::from(path));
    }

    let mut ctx = Context::default_context();
    if let Some(user) = matches.get_one::<String>("as") {
        ctx.impersonate(user.trim());
    }

    if let Some(("serve", sub)) = matches.subcommand() {
        if let Some(bind) = sub.get_one::<String>("bind") {
            settings.bind = bind.clone();
        }
        let rt = tokio::runtime::Runtime::new().context("Start tokio runtime")?;
        return rt.block_on(api::serve(&settings));
    }

    let mut conn = db::open_at(&settings.db_path)?;

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", settings.db_path.display());
        }
        Some(("user", sub)) => commands::users::handle(&mut conn, &ctx, sub)?,
        Some(("nft", sub)) => {
            let store = LocalFileStore::new(&settings.static_dir)?;
            commands::nfts::handle(&mut conn, &store, &ctx, sub)?
        }
        Some(("tx", sub)) => commands::transactions::handle(&conn, sub)?,
        Some(("balance", sub)) => commands::balances::handle(&conn, &ctx, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&conn, sub)?,
        Some(("doctor", _)) => commands::doctor::handle(&conn)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
