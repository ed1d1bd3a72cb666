// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Axum HTTP server and routes.

mod error;
mod extract;
mod handlers;

pub use error::{ApiError, ErrorBody};
pub use extract::{Acting, FORWARDED_FOR_HEADER, IMPERSONATE_HEADER};

use anyhow::{Context as _, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::Settings;
use crate::db;
use crate::storage::{FileStore, LocalFileStore};

/// Shared by every handler. SQLite work runs on the blocking pool while
/// holding the connection lock, so trades are serialized.
#[derive(Clone)]
pub struct AppState {
    pub conn: Arc<Mutex<Connection>>,
    pub store: Arc<dyn FileStore>,
    pub max_upload: usize,
}

impl AppState {
    pub fn new(conn: Connection, store: Arc<dyn FileStore>, max_upload: usize) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            store,
            max_upload,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    // room for the multipart framing around the file itself
    let body_limit = state.max_upload + 64 * 1024;

    Router::new()
        .route("/health", get(handlers::health_check))
        // Users
        .route("/user", get(handlers::list_users))
        .route("/user/:user_id", get(handlers::get_user))
        // NFTs
        .route("/nft", get(handlers::list_nfts))
        .route("/nft/mint", post(handlers::mint_nft))
        .route("/nft/mint/", post(handlers::mint_nft))
        .route("/nft/buy/:nft_id", post(handlers::buy_nft))
        .route("/nft/sell/:nft_id", post(handlers::sell_nft))
        .route("/nft/:nft_id", get(handlers::get_nft))
        .route("/nft/:nft_id/history", get(handlers::nft_history))
        // Ledger
        .route("/transaction", get(handlers::list_transactions))
        .route("/balance", get(handlers::balance_history))
        .route("/balance/:user_id", get(handlers::user_balance_history))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the database and image store named by `settings` and serve until
/// Ctrl+C or SIGTERM.
pub async fn serve(settings: &Settings) -> Result<()> {
    let conn = db::open_at(&settings.db_path)?;
    let store = LocalFileStore::new(&settings.static_dir)
        .with_context(|| format!("Open image store {}", settings.static_dir.display()))?;
    let state = AppState::new(conn, Arc::new(store), settings.max_upload);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&settings.bind)
        .await
        .with_context(|| format!("Bind {}", settings.bind))?;
    info!(
        addr = %settings.bind,
        db = %settings.db_path.display(),
        images = %settings.static_dir.display(),
        "Starting API server"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
