// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! HTTP API routes and shared application state.

use axum::routing::{delete, get, post, put};
use axum::Router;
use sqlx::SqlitePool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tally_server_config::{AuthConfig, ServerConfig, TokensConfig};
use tally_server_db::{ApiKeyRepository, LedgerRepository, UserRepository};

use crate::routes;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
	pub users: UserRepository,
	pub ledger: LedgerRepository,
	pub api_keys: ApiKeyRepository,
	pub auth_config: AuthConfig,
	pub tokens_config: TokensConfig,
	pub pool: SqlitePool,
}

/// Creates the application state from a database pool and configuration.
pub fn create_app_state(pool: SqlitePool, config: &ServerConfig) -> AppState {
	AppState {
		users: UserRepository::new(pool.clone()),
		ledger: LedgerRepository::new(pool.clone()),
		api_keys: ApiKeyRepository::new(pool.clone()),
		auth_config: config.auth.clone(),
		tokens_config: config.tokens.clone(),
		pool,
	}
}

/// Creates the main application router with all routes configured.
pub fn create_router(state: AppState) -> Router {
	let auth_routes = Router::new()
		.route("/signup", post(routes::auth::signup))
		.route("/signin", post(routes::auth::signin));

	let account_routes = Router::new()
		.route(
			"/",
			get(routes::account::get_account)
				.patch(routes::account::update_account)
				.delete(routes::account::delete_account),
		)
		.route("/password", put(routes::account::update_password));

	let token_routes = Router::new()
		.route("/balance", get(routes::tokens::get_balance))
		.route("/history", get(routes::tokens::get_history))
		.route("/deduct", post(routes::tokens::deduct_tokens))
		.route("/credit", post(routes::tokens::credit_tokens));

	let key_routes = Router::new()
		.route(
			"/",
			post(routes::keys::create_key).get(routes::keys::list_keys),
		)
		.route("/{id}", delete(routes::keys::revoke_key));

	Router::new()
		.route("/health", get(routes::health::health_check))
		.nest("/api/auth", auth_routes)
		.nest("/api/account", account_routes)
		.nest("/api/tokens", token_routes)
		.nest("/api/keys", key_routes)
		.merge(
			SwaggerUi::new("/api/docs")
				.url("/api/openapi.json", crate::api_docs::ApiDoc::openapi()),
		)
		.with_state(state)
}
