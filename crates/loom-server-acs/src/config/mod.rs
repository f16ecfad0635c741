// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Client configuration.
//!
//! Configuration is assembled from layers (built-in defaults, an optional
//! TOML file, `LOOM_ACS_*` environment variables) and validated once into an
//! immutable [`AcsConfig`].
//!
//! ```ignore
//! use loom_server_acs::config::AcsConfigLayer;
//!
//! let config = AcsConfigLayer::default()
//!     .with_uaa_uri("https://uaa.example.com/oauth/token")
//!     .with_client_id("my-service")
//!     .with_client_secret("s3cr3t")
//!     .with_acs_uri("https://acs.example.com")
//!     .with_zone_id("my-zone")
//!     .finalize()?;
//! ```

mod error;
mod layer;
mod sources;

pub use error::ConfigError;
pub use layer::{AcsConfigLayer, UaaConfigLayer};
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource};

use std::path::PathBuf;
use std::time::Duration;

use loom_common_secret::SecretString;
use regex::Regex;
use tracing::{debug, info};
use url::Url;

/// Seconds before expiry at which a token renewal starts.
pub const DEFAULT_RENEW_SECS_BEFORE: u64 = 60;

/// Scopes matching this pattern become `group` subject attributes.
pub const DEFAULT_USER_GROUPS_REGEX: &str = "g.*";

/// Transport timeout for UAA and ACS requests.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Authorization server (UAA) client credentials.
#[derive(Debug, Clone)]
pub struct UaaConfig {
	uri: Url,
	client_id: String,
	client_secret: SecretString,
}

impl UaaConfig {
	/// Token endpoint, e.g. `https://uaa.example.com/oauth/token`.
	pub fn uri(&self) -> &str {
		self.uri.as_str()
	}

	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	pub fn client_secret(&self) -> &SecretString {
		&self.client_secret
	}
}

/// Validated, immutable ACS client configuration.
#[derive(Debug, Clone)]
pub struct AcsConfig {
	uaa: UaaConfig,
	acs_uri: Url,
	zone_id: String,
	renew_secs_before: u64,
	user_groups_regex: Regex,
	request_timeout: Duration,
}

impl AcsConfig {
	pub fn uaa(&self) -> &UaaConfig {
		&self.uaa
	}

	/// Base URI of the decision service.
	pub fn acs_uri(&self) -> &str {
		self.acs_uri.as_str()
	}

	/// Value sent in the `Predix-Zone-Id` header.
	pub fn zone_id(&self) -> &str {
		&self.zone_id
	}

	pub fn renew_secs_before(&self) -> u64 {
		self.renew_secs_before
	}

	pub fn user_groups_regex(&self) -> &Regex {
		&self.user_groups_regex
	}

	pub fn request_timeout(&self) -> Duration {
		self.request_timeout
	}

	/// Join an API path onto the ACS base URI.
	pub fn acs_endpoint(&self, path: &str) -> String {
		format!(
			"{}/{}",
			self.acs_uri.as_str().trim_end_matches('/'),
			path.trim_start_matches('/')
		)
	}
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`LOOM_ACS_*`)
/// 2. Config file, when `config_path` is given (must exist)
/// 3. Built-in defaults
pub fn load_config(config_path: Option<PathBuf>) -> Result<AcsConfig, ConfigError> {
	let mut sources: Vec<Box<dyn ConfigSource>> = vec![Box::new(DefaultsSource), Box::new(EnvSource::new())];
	if let Some(path) = config_path {
		sources.push(Box::new(TomlSource::required(path)));
	}

	load_from_sources(sources)
}

/// Load configuration from environment only.
pub fn load_config_from_env() -> Result<AcsConfig, ConfigError> {
	load_from_sources(vec![Box::new(DefaultsSource), Box::new(EnvSource::new())])
}

/// Merge the given sources by precedence and validate the result.
pub fn load_from_sources(mut sources: Vec<Box<dyn ConfigSource>>) -> Result<AcsConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = AcsConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		merged.merge(source.load()?);
	}

	let config = merged.finalize()?;

	info!(
		uaa_uri = %config.uaa.uri,
		client_id = %config.uaa.client_id,
		acs_uri = %config.acs_uri,
		zone_id = %config.zone_id,
		renew_secs_before = config.renew_secs_before,
		"ACS client configuration loaded"
	);

	Ok(config)
}

/// Build an [`AcsConfig`] from already-resolved values. Called by
/// [`AcsConfigLayer::finalize`] once every required field is present.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build(
	uaa_uri: &str,
	client_id: String,
	client_secret: SecretString,
	acs_uri: &str,
	zone_id: String,
	renew_secs_before: u64,
	user_groups_regex: &str,
	request_timeout_secs: u64,
) -> Result<AcsConfig, ConfigError> {
	if renew_secs_before == 0 {
		return Err(ConfigError::invalid_value(
			"renewSecsBefore",
			"must be at least 1 second",
		));
	}

	if request_timeout_secs == 0 {
		return Err(ConfigError::invalid_value(
			"requestTimeoutSecs",
			"must be at least 1 second",
		));
	}

	let user_groups_regex = Regex::new(user_groups_regex)
		.map_err(|e| ConfigError::invalid_value("userGroupsRegEx", e.to_string()))?;

	Ok(AcsConfig {
		uaa: UaaConfig {
			uri: parse_http_url("uaa.uri", uaa_uri)?,
			client_id,
			client_secret,
		},
		acs_uri: parse_http_url("acsUri", acs_uri)?,
		zone_id,
		renew_secs_before,
		user_groups_regex,
		request_timeout: Duration::from_secs(request_timeout_secs),
	})
}

fn parse_http_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
	let url = Url::parse(raw.trim())
		.map_err(|e| ConfigError::invalid_value(field, format!("'{raw}' is not a valid URL: {e}")))?;

	if url.scheme() != "https" && url.scheme() != "http" {
		return Err(ConfigError::invalid_value(
			field,
			format!("unsupported scheme '{}'", url.scheme()),
		));
	}

	if url.host_str().is_none() {
		return Err(ConfigError::invalid_value(field, "URL must include a host"));
	}

	Ok(url)
}
