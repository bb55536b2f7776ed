// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Tally token ledger server.
//!
//! This crate provides the HTTP surface over the ledger: thin axum
//! handlers that validate input, call the repositories, and map errors
//! to responses. The ledger semantics themselves live in
//! `tally-server-db`.

pub mod api;
pub mod api_docs;
pub mod auth_middleware;
pub mod error;
pub mod routes;
pub mod validation;

pub use api::{create_app_state, create_router, AppState};
pub use api_docs::ApiDoc;
pub use error::ServerError;
