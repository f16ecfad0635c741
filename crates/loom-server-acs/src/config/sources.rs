// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: built-in defaults, TOML files, and environment
//! variables.

use std::collections::HashMap;
use std::path::PathBuf;

use loom_common_secret::SecretString;
use tracing::{debug, trace};

use super::layer::{AcsConfigLayer, UaaConfigLayer};
use super::{
	ConfigError, DEFAULT_RENEW_SECS_BEFORE, DEFAULT_REQUEST_TIMEOUT_SECS,
	DEFAULT_USER_GROUPS_REGEX,
};

pub const ENV_UAA_URI: &str = "LOOM_ACS_UAA_URI";
pub const ENV_UAA_CLIENT_ID: &str = "LOOM_ACS_UAA_CLIENT_ID";
pub const ENV_UAA_CLIENT_SECRET: &str = "LOOM_ACS_UAA_CLIENT_SECRET";
pub const ENV_ACS_URI: &str = "LOOM_ACS_URI";
pub const ENV_ZONE_ID: &str = "LOOM_ACS_ZONE_ID";
pub const ENV_RENEW_SECS_BEFORE: &str = "LOOM_ACS_RENEW_SECS_BEFORE";
pub const ENV_USER_GROUPS_REGEX: &str = "LOOM_ACS_USER_GROUPS_REGEX";
pub const ENV_REQUEST_TIMEOUT_SECS: &str = "LOOM_ACS_REQUEST_TIMEOUT_SECS";

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
	fn load(&self) -> Result<AcsConfigLayer, ConfigError>;
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

	fn load(&self) -> Result<AcsConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(AcsConfigLayer {
			renew_secs_before: Some(DEFAULT_RENEW_SECS_BEFORE),
			user_groups_regex: Some(DEFAULT_USER_GROUPS_REGEX.to_string()),
			request_timeout_secs: Some(DEFAULT_REQUEST_TIMEOUT_SECS),
			..Default::default()
		})
	}
}

/// TOML file configuration source.
pub struct TomlSource {
	path: PathBuf,
	required: bool,
}

impl TomlSource {
	/// A file that is skipped when it does not exist.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: false,
		}
	}

	/// A file the caller asked for explicitly; absence is an error.
	pub fn required(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			required: true,
		}
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<AcsConfigLayer, ConfigError> {
		if !self.required && !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(AcsConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: AcsConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

type Lookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Environment variable source.
///
/// Convention: `LOOM_ACS_<FIELD>`. The client secret may instead be read
/// from the file named by `LOOM_ACS_UAA_CLIENT_SECRET_FILE`.
pub struct EnvSource {
	lookup: Lookup,
}

impl EnvSource {
	/// Read from the process environment.
	pub fn new() -> Self {
		Self {
			lookup: Box::new(|name| std::env::var(name).ok()),
		}
	}

	/// Read from a fixed set of variables instead of the process environment.
	pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
	where
		K: Into<String>,
		V: Into<String>,
	{
		let vars: HashMap<String, String> = pairs
			.into_iter()
			.map(|(k, v)| (k.into(), v.into()))
			.collect();
		Self {
			lookup: Box::new(move |name| vars.get(name).cloned()),
		}
	}

	fn var(&self, name: &str) -> Option<String> {
		(self.lookup)(name).filter(|s| !s.is_empty())
	}

	fn u64(&self, name: &str) -> Result<Option<u64>, ConfigError> {
		match self.var(name) {
			Some(v) => v.trim().parse().map(Some).map_err(|_| {
				ConfigError::invalid_value(name, format!("invalid u64 value '{v}'"))
			}),
			None => Ok(None),
		}
	}

	/// `NAME` wins over `NAME_FILE`; file contents are trimmed.
	fn secret(&self, name: &str) -> Result<Option<SecretString>, ConfigError> {
		if let Some(value) = self.var(name) {
			return Ok(Some(SecretString::new(value)));
		}

		let file_var = format!("{name}_FILE");
		let Some(path) = self.var(&file_var) else {
			return Ok(None);
		};

		let path = PathBuf::from(path);
		let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileRead {
			path: path.clone(),
			source: e,
		})?;
		debug!(var = %file_var, "loaded secret from file");
		Ok(Some(SecretString::new(content.trim().to_string())))
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<AcsConfigLayer, ConfigError> {
		debug!("loading environment variables");
		Ok(AcsConfigLayer {
			uaa: Some(UaaConfigLayer {
				uri: self.var(ENV_UAA_URI),
				client_id: self.var(ENV_UAA_CLIENT_ID),
				client_secret: self.secret(ENV_UAA_CLIENT_SECRET)?,
			}),
			acs_uri: self.var(ENV_ACS_URI),
			zone_id: self.var(ENV_ZONE_ID),
			renew_secs_before: self.u64(ENV_RENEW_SECS_BEFORE)?,
			user_groups_regex: self.var(ENV_USER_GROUPS_REGEX),
			request_timeout_secs: self.u64(ENV_REQUEST_TIMEOUT_SECS)?,
		})
	}
}
