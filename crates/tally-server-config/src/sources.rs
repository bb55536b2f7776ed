// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files, and environment
//! variables.

use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::ServerConfigLayer;
use crate::sections::{
	AuthConfigLayer, DatabaseConfigLayer, HttpConfigLayer, LoggingConfigLayer, TokenPackage,
	TokensConfigLayer,
};

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ServerConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(ServerConfigLayer::default())
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new("/etc/tally/server.toml")
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(ServerConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: ServerConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: TALLY_SERVER_<SECTION>_<FIELD>
pub struct EnvSource;

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ServerConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(ServerConfigLayer {
			http: Some(HttpConfigLayer {
				host: env_var("TALLY_SERVER_HOST"),
				port: env_u16("TALLY_SERVER_PORT")?,
			}),
			database: Some(DatabaseConfigLayer {
				url: env_var("TALLY_SERVER_DATABASE_URL"),
			}),
			auth: Some(AuthConfigLayer {
				api_key_secret: env_var("TALLY_SERVER_API_KEY_SECRET"),
				signups_disabled: env_bool("TALLY_SERVER_SIGNUPS_DISABLED"),
			}),
			tokens: Some(TokensConfigLayer {
				signup_grant: env_i64("TALLY_SERVER_SIGNUP_GRANT")?,
				packages: env_packages("TALLY_SERVER_TOKEN_PACKAGES")?,
			}),
			logging: Some(LoggingConfigLayer {
				level: env_var("TALLY_SERVER_LOG_LEVEL"),
			}),
		})
	}
}

fn env_var(name: &str) -> Option<String> {
	std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_bool(name: &str) -> Option<bool> {
	env_var(name).map(|v| v.eq_ignore_ascii_case("true") || v == "1")
}

fn env_u16(name: &str) -> Result<Option<u16>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid u16 value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn env_i64(name: &str) -> Result<Option<i64>, ConfigError> {
	match env_var(name) {
		Some(v) => v.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid i64 value '{v}'"),
		}),
		None => Ok(None),
	}
}

/// Parse `id=tokens,id=tokens` package lists, e.g.
/// `starter=10000,growth=50000`.
fn env_packages(name: &str) -> Result<Option<Vec<TokenPackage>>, ConfigError> {
	let Some(raw) = env_var(name) else {
		return Ok(None);
	};

	let mut packages = Vec::new();
	for part in raw.split(',') {
		let part = part.trim();
		if part.is_empty() {
			continue;
		}
		let (id, tokens) = part
			.split_once('=')
			.ok_or_else(|| ConfigError::InvalidValue {
				key: name.to_string(),
				message: format!("expected id=tokens, got '{part}'"),
			})?;
		let tokens: i64 = tokens.parse().map_err(|_| ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid token amount '{tokens}'"),
		})?;
		packages.push(TokenPackage {
			id: id.trim().to_string(),
			tokens,
		});
	}
	Ok(Some(packages))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_toml_source_missing_file_is_empty_layer() {
		let layer = TomlSource::new("/nonexistent/tally.toml").load().unwrap();
		assert!(layer.http.is_none());
		assert!(layer.tokens.is_none());
	}

	#[test]
	fn test_toml_source_parses_sections() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		writeln!(
			file,
			r#"
			[http]
			port = 9001

			[tokens]
			signup_grant = 250

			[[tokens.packages]]
			id = "starter"
			tokens = 5000
			"#
		)
		.unwrap();

		let layer = TomlSource::new(file.path()).load().unwrap();
		assert_eq!(layer.http.unwrap().port, Some(9001));
		let tokens = layer.tokens.unwrap();
		assert_eq!(tokens.signup_grant, Some(250));
		assert_eq!(tokens.packages.unwrap()[0].tokens, 5000);
	}

	#[test]
	fn test_env_packages_parsing() {
		std::env::set_var("TALLY_TEST_PACKAGES_OK", "starter=10000, growth=50000");
		let packages = env_packages("TALLY_TEST_PACKAGES_OK").unwrap().unwrap();
		assert_eq!(packages.len(), 2);
		assert_eq!(packages[0].id, "starter");
		assert_eq!(packages[1].tokens, 50000);
		std::env::remove_var("TALLY_TEST_PACKAGES_OK");

		std::env::set_var("TALLY_TEST_PACKAGES_BAD", "starter:10000");
		assert!(env_packages("TALLY_TEST_PACKAGES_BAD").is_err());
		std::env::remove_var("TALLY_TEST_PACKAGES_BAD");
	}
}
