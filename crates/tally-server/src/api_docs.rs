// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! OpenAPI documentation for the Tally API.

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ErrorResponse;
use crate::routes::account::{
	AccountResponse, DeleteAccountRequest, UpdateAccountRequest, UpdatePasswordRequest,
};
use crate::routes::auth::{SigninRequest, SignupRequest};
use crate::routes::health::HealthResponse;
use crate::routes::keys::{CreateKeyRequest, CreateKeyResponse, KeySummary, ListKeysResponse};
use crate::routes::tokens::{
	BalanceResponse, CreditRequest, DeductRequest, HistoryResponse, LedgerEntryResponse,
	MutationResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Tally API",
        description = "Token ledger service: accounts, API keys, and atomic balance operations."
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::auth::signup,
        crate::routes::auth::signin,
        crate::routes::account::get_account,
        crate::routes::account::update_account,
        crate::routes::account::update_password,
        crate::routes::account::delete_account,
        crate::routes::tokens::get_balance,
        crate::routes::tokens::get_history,
        crate::routes::tokens::deduct_tokens,
        crate::routes::tokens::credit_tokens,
        crate::routes::keys::create_key,
        crate::routes::keys::list_keys,
        crate::routes::keys::revoke_key,
    ),
    components(schemas(
        ErrorResponse,
        HealthResponse,
        SignupRequest,
        SigninRequest,
        AccountResponse,
        UpdateAccountRequest,
        UpdatePasswordRequest,
        DeleteAccountRequest,
        BalanceResponse,
        HistoryResponse,
        LedgerEntryResponse,
        DeductRequest,
        CreditRequest,
        MutationResponse,
        CreateKeyRequest,
        CreateKeyResponse,
        KeySummary,
        ListKeysResponse,
    )),
    modifiers(&ApiKeySecurity),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Account signup and signin"),
        (name = "account", description = "Account management"),
        (name = "tokens", description = "Token balance and ledger operations"),
        (name = "keys", description = "API key management")
    )
)]
pub struct ApiDoc;

struct ApiKeySecurity;

impl Modify for ApiKeySecurity {
	fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
		if let Some(components) = openapi.components.as_mut() {
			components.add_security_scheme(
				"api_key",
				SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
			);
		}
	}
}
