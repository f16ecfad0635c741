// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

/// Errors that can occur while loading or validating [`AcsConfig`](super::AcsConfig).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// One or more required settings are absent or blank.
	#[error("Required configuration is missing: {}", .0.join(", "))]
	MissingFields(Vec<&'static str>),

	/// A setting is present but unusable.
	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	/// Config or secret file could not be read.
	#[error("Failed to read {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},
}

impl ConfigError {
	/// Create an invalid value error
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}

	/// Names of the missing required fields, if that is what went wrong.
	pub fn missing_fields(&self) -> &[&'static str] {
		match self {
			Self::MissingFields(fields) => fields,
			_ => &[],
		}
	}
}
