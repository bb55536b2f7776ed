// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Typed configuration sections and their mergeable layers.

mod auth;
mod database;
mod http;
mod logging;
mod tokens;

pub use auth::{AuthConfig, AuthConfigLayer, DEV_API_KEY_SECRET};
pub use database::{DatabaseConfig, DatabaseConfigLayer};
pub use http::{HttpConfig, HttpConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use tokens::{TokenPackage, TokensConfig, TokensConfigLayer};
