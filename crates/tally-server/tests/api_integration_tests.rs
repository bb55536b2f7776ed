// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Integration tests for the Tally HTTP API.
//!
//! Tests cover:
//! - Signup, signin, and the signup grant
//! - API key minting, authentication, and revocation
//! - Balance, deduct, credit, and history endpoints
//! - Account profile, password, and soft-delete flows
//! - Error status mapping (401/402/404/409)

use axum::{
	body::Body,
	http::{Request, StatusCode},
	Router,
};
use serde_json::{json, Value};
use tally_server::{create_app_state, create_router};
use tempfile::tempdir;
use tower::ServiceExt;

/// Creates a test app with an isolated file-backed database.
async fn setup_test_app() -> (Router, tempfile::TempDir) {
	let dir = tempdir().unwrap();
	let db_path = dir.path().join("test_api.db");
	let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
	let pool = tally_server_db::create_pool(&db_url).await.unwrap();
	tally_server_db::run_migrations(&pool).await.unwrap();
	let config = tally_server_config::ServerConfig::default();
	let state = create_app_state(pool, &config);
	(create_router(state), dir)
}

async fn request(
	app: &Router,
	method: &str,
	uri: &str,
	token: Option<&str>,
	body: Option<Value>,
) -> (StatusCode, Value) {
	let mut builder = Request::builder().method(method).uri(uri);
	if let Some(token) = token {
		builder = builder.header("Authorization", format!("Bearer {token}"));
	}
	let request = match body {
		Some(body) => builder
			.header("Content-Type", "application/json")
			.body(Body::from(body.to_string()))
			.unwrap(),
		None => builder.body(Body::empty()).unwrap(),
	};

	let response = app.clone().oneshot(request).await.unwrap();
	let status = response.status();
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let json = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).unwrap()
	};
	(status, json)
}

async fn signup(app: &Router, email: &str, password: &str) -> (StatusCode, Value) {
	request(
		app,
		"POST",
		"/api/auth/signup",
		None,
		Some(json!({ "email": email, "password": password })),
	)
	.await
}

/// Signs up a user and mints an API key, returning the plaintext key.
async fn signup_with_key(app: &Router, email: &str, password: &str) -> String {
	let (status, _) = signup(app, email, password).await;
	assert_eq!(status, StatusCode::CREATED);

	let (status, body) = request(
		app,
		"POST",
		"/api/keys",
		None,
		Some(json!({ "email": email, "password": password })),
	)
	.await;
	assert_eq!(status, StatusCode::CREATED);
	body["api_key"].as_str().unwrap().to_string()
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_check_returns_ok() {
	let (app, _dir) = setup_test_app().await;

	let (status, body) = request(&app, "GET", "/health", None, None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "ok");
	assert_eq!(body["database"], "ok");
}

// ============================================================================
// Signup and signin
// ============================================================================

#[tokio::test]
async fn test_signup_creates_account_with_grant() {
	let (app, _dir) = setup_test_app().await;

	let (status, body) = signup(&app, "alice@example.com", "password123").await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["email"], "alice@example.com");
	// Default config grants 1000 tokens at signup.
	assert_eq!(body["token_balance"], 1000);
	assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_signup_duplicate_email_conflicts() {
	let (app, _dir) = setup_test_app().await;

	let (status, _) = signup(&app, "dup@example.com", "password123").await;
	assert_eq!(status, StatusCode::CREATED);

	let (status, body) = signup(&app, "dup@example.com", "password456").await;
	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_signup_validates_email_and_password() {
	let (app, _dir) = setup_test_app().await;

	let (status, body) = signup(&app, "not-an-email", "password123").await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "invalid_email");

	let (status, body) = signup(&app, "short@example.com", "short").await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "invalid_password");
}

#[tokio::test]
async fn test_signup_email_is_sanitized() {
	let (app, _dir) = setup_test_app().await;

	let (status, body) = signup(&app, "  Carol@Example.COM  ", "password123").await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["email"], "carol@example.com");
}

#[tokio::test]
async fn test_signup_can_be_disabled() {
	let dir = tempdir().unwrap();
	let db_path = dir.path().join("test_disabled.db");
	let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
	let pool = tally_server_db::create_pool(&db_url).await.unwrap();
	tally_server_db::run_migrations(&pool).await.unwrap();
	let mut config = tally_server_config::ServerConfig::default();
	config.auth.signups_disabled = true;
	let app = create_router(create_app_state(pool, &config));

	let (status, body) = signup(&app, "late@example.com", "password123").await;
	assert_eq!(status, StatusCode::FORBIDDEN);
	assert_eq!(body["error"], "signups_disabled");
}

#[tokio::test]
async fn test_signin_accepts_valid_and_rejects_invalid() {
	let (app, _dir) = setup_test_app().await;
	signup(&app, "bob@example.com", "password123").await;

	let (status, body) = request(
		&app,
		"POST",
		"/api/auth/signin",
		None,
		Some(json!({ "email": "bob@example.com", "password": "password123" })),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["email"], "bob@example.com");

	// Wrong password and unknown email are indistinguishable.
	let (status, body) = request(
		&app,
		"POST",
		"/api/auth/signin",
		None,
		Some(json!({ "email": "bob@example.com", "password": "wrong-password" })),
	)
	.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["error"], "invalid_credentials");

	let (status, body) = request(
		&app,
		"POST",
		"/api/auth/signin",
		None,
		Some(json!({ "email": "nobody@example.com", "password": "password123" })),
	)
	.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["error"], "invalid_credentials");
}

// ============================================================================
// API keys
// ============================================================================

#[tokio::test]
async fn test_api_key_lifecycle() {
	let (app, _dir) = setup_test_app().await;
	let key = signup_with_key(&app, "keyuser@example.com", "password123").await;
	assert!(key.starts_with("tally_sk_"));

	// The key authenticates requests.
	let (status, body) = request(&app, "GET", "/api/tokens/balance", Some(&key), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["balance"], 1000);

	// List shows the key without its hash or plaintext.
	let (status, body) = request(&app, "GET", "/api/keys", Some(&key), None).await;
	assert_eq!(status, StatusCode::OK);
	let keys = body["keys"].as_array().unwrap();
	assert_eq!(keys.len(), 1);
	assert!(keys[0].get("token_hash").is_none());
	assert!(keys[0].get("api_key").is_none());
	let key_id = keys[0]["id"].as_str().unwrap().to_string();

	// Revoke it; it stops authenticating.
	let (status, _) = request(
		&app,
		"DELETE",
		&format!("/api/keys/{key_id}"),
		Some(&key),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, _) = request(&app, "GET", "/api/tokens/balance", Some(&key), None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_revoking_one_key_leaves_others_active() {
	let (app, _dir) = setup_test_app().await;
	let first = signup_with_key(&app, "twokeys@example.com", "password123").await;

	let (status, body) = request(
		&app,
		"POST",
		"/api/keys",
		None,
		Some(json!({ "email": "twokeys@example.com", "password": "password123" })),
	)
	.await;
	assert_eq!(status, StatusCode::CREATED);
	let second = body["api_key"].as_str().unwrap().to_string();
	let second_id = body["id"].as_str().unwrap().to_string();
	assert_ne!(first, second);

	let (status, _) = request(
		&app,
		"DELETE",
		&format!("/api/keys/{second_id}"),
		Some(&first),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, _) = request(&app, "GET", "/api/tokens/balance", Some(&second), None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let (status, _) = request(&app, "GET", "/api/tokens/balance", Some(&first), None).await;
	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_key_creation_requires_valid_credentials() {
	let (app, _dir) = setup_test_app().await;
	signup(&app, "creds@example.com", "password123").await;

	let (status, body) = request(
		&app,
		"POST",
		"/api/keys",
		None,
		Some(json!({ "email": "creds@example.com", "password": "wrong" })),
	)
	.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["error"], "invalid_credentials");
}

#[tokio::test]
async fn test_requests_without_bearer_token_are_rejected() {
	let (app, _dir) = setup_test_app().await;

	for uri in ["/api/tokens/balance", "/api/account", "/api/keys"] {
		let (status, body) = request(&app, "GET", uri, None, None).await;
		assert_eq!(status, StatusCode::UNAUTHORIZED);
		assert_eq!(body["error"], "unauthorized");
	}

	let (status, _) = request(
		&app,
		"GET",
		"/api/tokens/balance",
		Some("tally_sk_0000000000000000"),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Token operations
// ============================================================================

#[tokio::test]
async fn test_deduct_within_balance() {
	let (app, _dir) = setup_test_app().await;
	let key = signup_with_key(&app, "deduct@example.com", "password123").await;

	let (status, body) = request(
		&app,
		"POST",
		"/api/tokens/deduct",
		Some(&key),
		Some(json!({ "amount": 400, "description": "Completion tokens" })),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["balance"], 600);
	assert_eq!(body["amount"], 400);

	let (_, body) = request(&app, "GET", "/api/tokens/balance", Some(&key), None).await;
	assert_eq!(body["balance"], 600);
}

#[tokio::test]
async fn test_overdraft_returns_402_and_leaves_state_untouched() {
	let (app, _dir) = setup_test_app().await;
	let key = signup_with_key(&app, "overdraft@example.com", "password123").await;

	let (status, body) = request(
		&app,
		"POST",
		"/api/tokens/deduct",
		Some(&key),
		Some(json!({ "amount": 5000 })),
	)
	.await;
	assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
	assert_eq!(body["error"], "insufficient_balance");

	let (_, body) = request(&app, "GET", "/api/tokens/balance", Some(&key), None).await;
	assert_eq!(body["balance"], 1000);

	// No entry was appended for the failed deduction.
	let (_, body) = request(&app, "GET", "/api/tokens/history", Some(&key), None).await;
	assert_eq!(body["entries"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_positive_amounts_are_rejected() {
	let (app, _dir) = setup_test_app().await;
	let key = signup_with_key(&app, "zero@example.com", "password123").await;

	for amount in [0, -100] {
		let (status, body) = request(
			&app,
			"POST",
			"/api/tokens/deduct",
			Some(&key),
			Some(json!({ "amount": amount })),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "invalid_amount");
	}
}

#[tokio::test]
async fn test_credit_with_configured_package() {
	let (app, _dir) = setup_test_app().await;
	let key = signup_with_key(&app, "buyer@example.com", "password123").await;

	let (status, body) = request(
		&app,
		"POST",
		"/api/tokens/credit",
		Some(&key),
		Some(json!({ "package": "starter" })),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["amount"], 10000);
	assert_eq!(body["balance"], 11000);

	let (status, body) = request(
		&app,
		"POST",
		"/api/tokens/credit",
		Some(&key),
		Some(json!({ "package": "nonexistent" })),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "unknown_package");
}

#[tokio::test]
async fn test_history_orders_and_describes_entries() {
	let (app, _dir) = setup_test_app().await;
	let key = signup_with_key(&app, "history@example.com", "password123").await;

	request(
		&app,
		"POST",
		"/api/tokens/deduct",
		Some(&key),
		Some(json!({ "amount": 100 })),
	)
	.await;
	request(
		&app,
		"POST",
		"/api/tokens/credit",
		Some(&key),
		Some(json!({ "package": "starter" })),
	)
	.await;

	// Default is newest first.
	let (status, body) = request(&app, "GET", "/api/tokens/history", Some(&key), None).await;
	assert_eq!(status, StatusCode::OK);
	let entries = body["entries"].as_array().unwrap();
	assert_eq!(entries.len(), 3);
	assert_eq!(entries[0]["kind"], "purchase");
	assert_eq!(entries[1]["kind"], "deduction");
	assert_eq!(entries[1]["amount"], -100);
	assert_eq!(entries[1]["description"], "API request");
	assert_eq!(entries[2]["kind"], "grant");

	// Ascending puts the signup grant first.
	let (_, body) = request(
		&app,
		"GET",
		"/api/tokens/history?order=asc",
		Some(&key),
		None,
	)
	.await;
	let entries = body["entries"].as_array().unwrap();
	assert_eq!(entries[0]["kind"], "grant");
	assert_eq!(entries[0]["amount"], 1000);

	let (status, body) = request(
		&app,
		"GET",
		"/api/tokens/history?order=sideways",
		Some(&key),
		None,
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "invalid_order");
}

// ============================================================================
// Account management
// ============================================================================

#[tokio::test]
async fn test_account_profile_roundtrip() {
	let (app, _dir) = setup_test_app().await;
	let key = signup_with_key(&app, "profile@example.com", "password123").await;

	let (status, body) = request(&app, "GET", "/api/account", Some(&key), None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["email"], "profile@example.com");
	assert!(body["name"].is_null());

	let (status, body) = request(
		&app,
		"PATCH",
		"/api/account",
		Some(&key),
		Some(json!({ "name": "Ada Lovelace" })),
	)
	.await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["name"], "Ada Lovelace");
	// Email is unchanged when omitted.
	assert_eq!(body["email"], "profile@example.com");
}

#[tokio::test]
async fn test_password_change_flow() {
	let (app, _dir) = setup_test_app().await;
	let key = signup_with_key(&app, "rotate@example.com", "password123").await;

	// Wrong current password is rejected.
	let (status, body) = request(
		&app,
		"PUT",
		"/api/account/password",
		Some(&key),
		Some(json!({ "current_password": "wrong", "new_password": "password456" })),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "invalid_current_password");

	// Same password is rejected.
	let (status, body) = request(
		&app,
		"PUT",
		"/api/account/password",
		Some(&key),
		Some(json!({ "current_password": "password123", "new_password": "password123" })),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "password_unchanged");

	let (status, _) = request(
		&app,
		"PUT",
		"/api/account/password",
		Some(&key),
		Some(json!({ "current_password": "password123", "new_password": "password456" })),
	)
	.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	// Signin only works with the new password.
	let (status, _) = request(
		&app,
		"POST",
		"/api/auth/signin",
		None,
		Some(json!({ "email": "rotate@example.com", "password": "password456" })),
	)
	.await;
	assert_eq!(status, StatusCode::OK);

	let (status, _) = request(
		&app,
		"POST",
		"/api/auth/signin",
		None,
		Some(json!({ "email": "rotate@example.com", "password": "password123" })),
	)
	.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_account_deletion_frees_email_and_hides_account() {
	let (app, _dir) = setup_test_app().await;
	let key = signup_with_key(&app, "leaver@example.com", "password123").await;

	// Deletion requires the correct password.
	let (status, _) = request(
		&app,
		"DELETE",
		"/api/account",
		Some(&key),
		Some(json!({ "password": "wrong" })),
	)
	.await;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, _) = request(
		&app,
		"DELETE",
		"/api/account",
		Some(&key),
		Some(json!({ "password": "password123" })),
	)
	.await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	// The key still authenticates but the account is gone.
	let (status, _) = request(&app, "GET", "/api/account", Some(&key), None).await;
	assert_eq!(status, StatusCode::NOT_FOUND);

	// Signin no longer works and the email is reusable.
	let (status, _) = request(
		&app,
		"POST",
		"/api/auth/signin",
		None,
		Some(json!({ "email": "leaver@example.com", "password": "password123" })),
	)
	.await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let (status, _) = signup(&app, "leaver@example.com", "password789").await;
	assert_eq!(status, StatusCode::CREATED);
}
