// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Error types for the ACS client.

use thiserror::Error;

use crate::config::ConfigError;
use crate::types::Verdict;

/// Failure reported by an [`HttpTransport`](crate::transport::HttpTransport).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportFailure {
	/// Request did not complete within the transport timeout.
	#[error("request timed out")]
	Timeout,

	/// Connection, TLS or body-read failure.
	#[error("network error: {0}")]
	Network(String),
}

impl From<reqwest::Error> for TransportFailure {
	fn from(err: reqwest::Error) -> Self {
		if err.is_timeout() {
			TransportFailure::Timeout
		} else {
			TransportFailure::Network(err.to_string())
		}
	}
}

/// The authorization server (UAA) could not issue a token.
///
/// `Clone` so one fetch outcome can be handed to every caller waiting on it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TokenError {
	/// The token request never got a response.
	#[error("error getting token: {0}")]
	Transport(#[from] TransportFailure),

	/// UAA answered with something other than 200.
	#[error("error getting token: {status}")]
	Status { status: u16, body: String },

	/// UAA answered 200 but the body was not a usable token response.
	#[error("invalid token response: {0}")]
	InvalidResponse(String),

	/// The background fetch task was cancelled or panicked.
	#[error("token fetch task failed: {0}")]
	TaskFailed(String),
}

/// An authorization request is missing required fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid authorization request, missing: {}", .missing.join(", "))]
pub struct ValidationError {
	missing: Vec<&'static str>,
}

impl ValidationError {
	pub(crate) fn new(missing: Vec<&'static str>) -> Self {
		Self { missing }
	}

	/// Names of the missing fields, in wire (camelCase) form.
	pub fn missing(&self) -> &[&'static str] {
		&self.missing
	}
}

/// Errors returned by [`AcsClient`](crate::AcsClient).
#[derive(Debug, Error)]
pub enum AcsError {
	/// Client configuration is incomplete or invalid.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The authorization request is incomplete; nothing was sent.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// No valid token could be obtained from UAA.
	#[error(transparent)]
	AuthServer(#[from] TokenError),

	/// The ACS call failed or returned an unusable response.
	#[error("error getting verdict: {message}")]
	Transport { status: Option<u16>, message: String },

	/// ACS evaluated the request and did not permit it.
	#[error("access denied: effect {}", .0.effect)]
	Denied(Box<Verdict>),
}

impl AcsError {
	pub(crate) fn transport(status: Option<u16>, message: impl Into<String>) -> Self {
		Self::Transport {
			status,
			message: message.into(),
		}
	}

	/// True when ACS explicitly refused access, as opposed to failing.
	pub fn is_denied(&self) -> bool {
		matches!(self, AcsError::Denied(_))
	}

	/// The non-permit verdict, if this is a denial.
	pub fn verdict(&self) -> Option<&Verdict> {
		match self {
			AcsError::Denied(verdict) => Some(verdict),
			_ => None,
		}
	}

	/// Consume the error, returning the verdict of a denial.
	pub fn into_verdict(self) -> Option<Verdict> {
		match self {
			AcsError::Denied(verdict) => Some(*verdict),
			_ => None,
		}
	}
}
