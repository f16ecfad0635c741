// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration layers and their validation.

use loom_common_secret::SecretString;
use serde::{Deserialize, Serialize};

use super::{
	build, AcsConfig, ConfigError, DEFAULT_RENEW_SECS_BEFORE, DEFAULT_REQUEST_TIMEOUT_SECS,
	DEFAULT_USER_GROUPS_REGEX,
};

/// UAA section of a configuration layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UaaConfigLayer {
	pub uri: Option<String>,
	#[serde(alias = "clientId")]
	pub client_id: Option<String>,
	#[serde(alias = "clientSecret")]
	pub client_secret: Option<SecretString>,
}

impl UaaConfigLayer {
	pub fn merge(&mut self, other: Self) {
		if other.uri.is_some() {
			self.uri = other.uri;
		}
		if other.client_id.is_some() {
			self.client_id = other.client_id;
		}
		if other.client_secret.is_some() {
			self.client_secret = other.client_secret;
		}
	}
}

/// One source's view of the configuration. Every field is optional; layers
/// are merged and then [`finalize`](Self::finalize)d.
///
/// Keys are snake_case; the camelCase spellings (`acsUri`, `zoneId`,
/// `renewSecsBefore`, `userGroupsRegEx`, `uaa.clientId`, ...) are accepted
/// as aliases.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcsConfigLayer {
	#[serde(default)]
	pub uaa: Option<UaaConfigLayer>,
	#[serde(alias = "acsUri")]
	pub acs_uri: Option<String>,
	#[serde(alias = "zoneId")]
	pub zone_id: Option<String>,
	#[serde(alias = "renewSecsBefore")]
	pub renew_secs_before: Option<u64>,
	#[serde(alias = "userGroupsRegEx")]
	pub user_groups_regex: Option<String>,
	#[serde(alias = "requestTimeoutSecs")]
	pub request_timeout_secs: Option<u64>,
}

impl AcsConfigLayer {
	/// Overlay `other` on top of `self`; set fields in `other` win.
	pub fn merge(&mut self, other: Self) {
		if let Some(other_uaa) = other.uaa {
			let uaa = self.uaa.get_or_insert_with(Default::default);
			uaa.merge(other_uaa);
		}
		if other.acs_uri.is_some() {
			self.acs_uri = other.acs_uri;
		}
		if other.zone_id.is_some() {
			self.zone_id = other.zone_id;
		}
		if other.renew_secs_before.is_some() {
			self.renew_secs_before = other.renew_secs_before;
		}
		if other.user_groups_regex.is_some() {
			self.user_groups_regex = other.user_groups_regex;
		}
		if other.request_timeout_secs.is_some() {
			self.request_timeout_secs = other.request_timeout_secs;
		}
	}

	pub fn with_uaa_uri(mut self, uri: impl Into<String>) -> Self {
		self.uaa_mut().uri = Some(uri.into());
		self
	}

	pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
		self.uaa_mut().client_id = Some(client_id.into());
		self
	}

	pub fn with_client_secret(mut self, client_secret: impl Into<String>) -> Self {
		self.uaa_mut().client_secret = Some(SecretString::new(client_secret.into()));
		self
	}

	pub fn with_acs_uri(mut self, acs_uri: impl Into<String>) -> Self {
		self.acs_uri = Some(acs_uri.into());
		self
	}

	pub fn with_zone_id(mut self, zone_id: impl Into<String>) -> Self {
		self.zone_id = Some(zone_id.into());
		self
	}

	pub fn with_renew_secs_before(mut self, secs: u64) -> Self {
		self.renew_secs_before = Some(secs);
		self
	}

	pub fn with_user_groups_regex(mut self, pattern: impl Into<String>) -> Self {
		self.user_groups_regex = Some(pattern.into());
		self
	}

	pub fn with_request_timeout_secs(mut self, secs: u64) -> Self {
		self.request_timeout_secs = Some(secs);
		self
	}

	fn uaa_mut(&mut self) -> &mut UaaConfigLayer {
		self.uaa.get_or_insert_with(Default::default)
	}

	/// Validate the merged layer into an [`AcsConfig`].
	///
	/// Blank values count as missing. When anything required is missing the
	/// error lists every missing field, not just the first.
	pub fn finalize(self) -> Result<AcsConfig, ConfigError> {
		let uaa = self.uaa.unwrap_or_default();
		let mut missing = Vec::new();

		let uaa_uri = required(uaa.uri, "uaa.uri", &mut missing);
		let client_id = required(uaa.client_id, "uaa.clientId", &mut missing);
		let client_secret = uaa.client_secret.filter(|s| !s.is_blank());
		if client_secret.is_none() {
			missing.push("uaa.clientSecret");
		}
		let acs_uri = required(self.acs_uri, "acsUri", &mut missing);
		let zone_id = required(self.zone_id, "zoneId", &mut missing);

		let (Some(uaa_uri), Some(client_id), Some(client_secret), Some(acs_uri), Some(zone_id)) =
			(uaa_uri, client_id, client_secret, acs_uri, zone_id)
		else {
			return Err(ConfigError::MissingFields(missing));
		};

		build(
			&uaa_uri,
			client_id,
			client_secret,
			&acs_uri,
			zone_id,
			self.renew_secs_before.unwrap_or(DEFAULT_RENEW_SECS_BEFORE),
			self
				.user_groups_regex
				.as_deref()
				.unwrap_or(DEFAULT_USER_GROUPS_REGEX),
			self
				.request_timeout_secs
				.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
		)
	}
}

fn required(
	value: Option<String>,
	name: &'static str,
	missing: &mut Vec<&'static str>,
) -> Option<String> {
	let value = value.filter(|v| !v.trim().is_empty());
	if value.is_none() {
		missing.push(name);
	}
	value
}
