// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Token balance, history, and mutation HTTP handlers.

use axum::{
	extract::{Query, State},
	Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tally_server_auth::{EntryId, EntryKind};
use tally_server_db::{LedgerEntry, SortOrder};

use crate::{api::AppState, auth_middleware::RequireAuth, error::ServerError};

const DEFAULT_DEDUCT_DESCRIPTION: &str = "API request";

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct BalanceResponse {
	pub balance: i64,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct LedgerEntryResponse {
	#[schema(value_type = uuid::Uuid)]
	pub id: EntryId,
	pub amount: i64,
	#[schema(value_type = String)]
	pub kind: EntryKind,
	pub description: Option<String>,
	pub created_at: DateTime<Utc>,
}

impl From<LedgerEntry> for LedgerEntryResponse {
	fn from(entry: LedgerEntry) -> Self {
		Self {
			id: entry.id,
			amount: entry.amount,
			kind: entry.kind,
			description: entry.description,
			created_at: entry.created_at,
		}
	}
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct HistoryResponse {
	pub entries: Vec<LedgerEntryResponse>,
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
	pub order: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeductRequest {
	pub amount: i64,
	pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct CreditRequest {
	pub package: String,
}

#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct MutationResponse {
	pub balance: i64,
	pub amount: i64,
}

#[utoipa::path(
    get,
    path = "/api/tokens/balance",
    responses(
        (status = 200, description = "Current balance", body = BalanceResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 404, description = "Account not found", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "tokens"
)]
/// GET /api/tokens/balance - Current token balance.
#[tracing::instrument(skip(state, current))]
pub async fn get_balance(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, ServerError> {
	let balance = state.ledger.balance(&current.user_id).await?;
	Ok(Json(BalanceResponse { balance }))
}

#[utoipa::path(
    get,
    path = "/api/tokens/history",
    params(
        ("order" = Option<String>, Query, description = "Sort order: asc or desc (default desc)")
    ),
    responses(
        (status = 200, description = "Transaction history", body = HistoryResponse),
        (status = 400, description = "Invalid sort order", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "tokens"
)]
/// GET /api/tokens/history - Transaction history, newest first by default.
#[tracing::instrument(skip(state, current))]
pub async fn get_history(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ServerError> {
	let order = match query.order.as_deref() {
		None | Some("desc") => SortOrder::Descending,
		Some("asc") => SortOrder::Ascending,
		Some(other) => {
			return Err(ServerError::validation(
				"invalid_order",
				format!("Sort order must be 'asc' or 'desc', got '{other}'"),
			));
		}
	};

	let entries = state.ledger.entries(&current.user_id, order).await?;
	Ok(Json(HistoryResponse {
		entries: entries.into_iter().map(Into::into).collect(),
	}))
}

#[utoipa::path(
    post,
    path = "/api/tokens/deduct",
    request_body = DeductRequest,
    responses(
        (status = 200, description = "Tokens deducted", body = MutationResponse),
        (status = 400, description = "Invalid amount", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 402, description = "Insufficient balance", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "tokens"
)]
/// POST /api/tokens/deduct - Atomically deduct tokens from the balance.
///
/// Fails with 402 when the balance cannot cover the amount; the balance
/// and history are untouched in that case.
#[tracing::instrument(skip(state, current), fields(amount = request.amount))]
pub async fn deduct_tokens(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Json(request): Json<DeductRequest>,
) -> Result<Json<MutationResponse>, ServerError> {
	let description = request
		.description
		.as_deref()
		.unwrap_or(DEFAULT_DEDUCT_DESCRIPTION);

	let balance = state
		.ledger
		.deduct(&current.user_id, request.amount, description)
		.await?;

	Ok(Json(MutationResponse {
		balance,
		amount: request.amount,
	}))
}

#[utoipa::path(
    post,
    path = "/api/tokens/credit",
    request_body = CreditRequest,
    responses(
        (status = 200, description = "Tokens credited", body = MutationResponse),
        (status = 400, description = "Unknown package", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse)
    ),
    security(("api_key" = [])),
    tag = "tokens"
)]
/// POST /api/tokens/credit - Purchase a configured token package.
#[tracing::instrument(skip(state, current), fields(package = %request.package))]
pub async fn credit_tokens(
	RequireAuth(current): RequireAuth,
	State(state): State<AppState>,
	Json(request): Json<CreditRequest>,
) -> Result<Json<MutationResponse>, ServerError> {
	let Some(package) = state.tokens_config.package(&request.package) else {
		return Err(ServerError::validation(
			"unknown_package",
			format!("Unknown token package '{}'", request.package),
		));
	};
	let amount = package.tokens;
	let description = format!("Token purchase: {}", package.id);

	let balance = state
		.ledger
		.credit(&current.user_id, amount, EntryKind::Purchase, &description)
		.await?;

	Ok(Json(MutationResponse { balance, amount }))
}
