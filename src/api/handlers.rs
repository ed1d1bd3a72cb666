// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Request handlers. Each one parses its inputs, then runs the domain call on
//! the blocking pool with the shared connection.

use axum::Json;
use axum::extract::multipart::{Field, MultipartRejection};
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use rusqlite::Connection;
use serde_json::{Value, json};
use std::sync::Arc;

use super::error::ApiError;
use super::extract::Acting;
use super::AppState;
use crate::catalog;
use crate::context::Context;
use crate::error::MarketError;
use crate::mint::{self, MintRequest};
use crate::models::{AssetDetail, AssetSummary, BalanceView, TransactionView, UserView};
use crate::repo::Page;
use crate::storage::FileStore;
use crate::trade::{self, TradeKind, TradeRequest};

type ApiResult<T> = Result<Json<T>, ApiError>;

const ALLOWED_CONTENT_TYPES: [&str; 2] = ["image/jpeg", "image/png"];

async fn blocking<T, F>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&mut Connection, &dyn FileStore) -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let conn = Arc::clone(&state.conn);
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || {
        let mut guard = conn.lock();
        f(&mut *guard, store.as_ref())
    })
    .await
    .map_err(|e| ApiError(MarketError::internal_with("Worker task failed", e)))?
    .map_err(ApiError)
}

fn page(query: Result<Query<Page>, QueryRejection>) -> Result<Page, ApiError> {
    let Query(page) = query.map_err(|e| ApiError::validation(e.body_text()))?;
    Ok(page.validated()?)
}

fn id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|e| ApiError::validation(e.body_text()))
}

fn trade_body(body: Result<Json<TradeRequest>, JsonRejection>) -> Result<TradeRequest, ApiError> {
    match body {
        Ok(Json(req)) => Ok(req),
        Err(JsonRejection::MissingJsonContentType(e)) => {
            Err(ApiError(MarketError::bad_request(e.body_text())))
        }
        Err(e) => Err(ApiError::validation(e.body_text())),
    }
}

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

// ==========================================
// Users
// ==========================================

pub async fn list_users(
    State(state): State<AppState>,
    query: Result<Query<Page>, QueryRejection>,
) -> ApiResult<Vec<UserView>> {
    let page = page(query)?;
    let users = blocking(&state, move |conn, _| catalog::list_users(conn, page)).await?;
    Ok(Json(users))
}

pub async fn get_user(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<UserView> {
    let user_id = id(path)?;
    let user = blocking(&state, move |conn, _| catalog::get_user(conn, user_id)).await?;
    Ok(Json(user))
}

// ==========================================
// NFTs
// ==========================================

pub async fn list_nfts(
    State(state): State<AppState>,
    query: Result<Query<Page>, QueryRejection>,
) -> ApiResult<Vec<AssetSummary>> {
    let page = page(query)?;
    let nfts = blocking(&state, move |conn, store| catalog::list_assets(conn, store, page)).await?;
    Ok(Json(nfts))
}

pub async fn get_nft(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<AssetDetail> {
    let nft_id = id(path)?;
    let nft = blocking(&state, move |conn, store| catalog::get_asset(conn, store, nft_id)).await?;
    Ok(Json(nft))
}

pub async fn nft_history(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Vec<TransactionView>> {
    let nft_id = id(path)?;
    let history = blocking(&state, move |conn, _| catalog::asset_history(conn, nft_id)).await?;
    Ok(Json(history))
}

async fn field_text(field: Field<'_>) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))
}

/// Collect the `file`, `description` and repeated `creators` parts.
async fn read_mint_form(mut form: Multipart, max_upload: usize) -> Result<MintRequest, ApiError> {
    let mut description = None;
    let mut creators = Vec::new();
    let mut upload = None;

    while let Some(field) = form
        .next_field()
        .await
        .map_err(|e| ApiError::validation(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "description" => description = Some(field_text(field).await?),
            "creators" => {
                let name = field_text(field).await?;
                if !name.trim().is_empty() {
                    creators.push(name.trim().to_string());
                }
            }
            "file" => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                if !ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
                    return Err(MarketError::bad_request("File extension not allowed").into());
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::validation(e.body_text()))?;
                if bytes.len() >= max_upload {
                    return Err(ApiError::validation(format!(
                        "file must be smaller than {} bytes",
                        max_upload
                    )));
                }
                upload = Some((filename, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let (filename, bytes) = upload.ok_or_else(|| ApiError::validation("file is required"))?;
    let description = description.ok_or_else(|| ApiError::validation("description is required"))?;
    Ok(MintRequest {
        description,
        creators,
        filename,
        bytes,
    })
}

pub async fn mint_nft(
    State(state): State<AppState>,
    Acting(ctx): Acting,
    form: Result<Multipart, MultipartRejection>,
) -> ApiResult<AssetDetail> {
    let form = form.map_err(|e| ApiError::validation(e.body_text()))?;
    let req = read_mint_form(form, state.max_upload).await?;
    let nft = blocking(&state, move |conn, store| mint::mint(conn, store, &ctx, &req)).await?;
    Ok(Json(nft))
}

async fn run_trade(
    state: AppState,
    ctx: Context,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<TradeRequest>, JsonRejection>,
    kind: TradeKind,
) -> ApiResult<TransactionView> {
    let nft_id = id(path)?;
    let req = trade_body(body)?;
    let receipt =
        blocking(&state, move |conn, _| trade::trade(conn, &ctx, nft_id, &req, kind)).await?;
    Ok(Json(receipt.view()))
}

pub async fn buy_nft(
    State(state): State<AppState>,
    Acting(ctx): Acting,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<TradeRequest>, JsonRejection>,
) -> ApiResult<TransactionView> {
    run_trade(state, ctx, path, body, TradeKind::Buy).await
}

pub async fn sell_nft(
    State(state): State<AppState>,
    Acting(ctx): Acting,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<TradeRequest>, JsonRejection>,
) -> ApiResult<TransactionView> {
    run_trade(state, ctx, path, body, TradeKind::Sell).await
}

// ==========================================
// Ledger
// ==========================================

pub async fn list_transactions(
    State(state): State<AppState>,
    query: Result<Query<Page>, QueryRejection>,
) -> ApiResult<Vec<TransactionView>> {
    let page = page(query)?;
    let txs = blocking(&state, move |conn, _| catalog::list_transactions(conn, page)).await?;
    Ok(Json(txs))
}

pub async fn balance_history(
    State(state): State<AppState>,
    query: Result<Query<Page>, QueryRejection>,
) -> ApiResult<Vec<BalanceView>> {
    let page = page(query)?;
    let rows = blocking(&state, move |conn, _| catalog::balance_history(conn, page)).await?;
    Ok(Json(rows))
}

pub async fn user_balance_history(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<Page>, QueryRejection>,
) -> ApiResult<Vec<BalanceView>> {
    let user_id = id(path)?;
    let page = page(query)?;
    let rows = blocking(&state, move |conn, _| {
        catalog::user_balance_history(conn, user_id, page)
    })
    .await?;
    Ok(Json(rows))
}
