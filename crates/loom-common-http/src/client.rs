// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP client with consistent User-Agent header.

use reqwest::{Client, ClientBuilder};
use std::time::Duration;
use tracing::debug;

/// Default end-to-end timeout applied to every request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default TCP/TLS connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Creates a new HTTP client with the standard User-Agent and default
/// timeouts.
pub fn new_client() -> Result<Client, reqwest::Error> {
	new_client_with_timeout(DEFAULT_REQUEST_TIMEOUT)
}

/// Creates a new HTTP client with a custom request timeout.
pub fn new_client_with_timeout(timeout: Duration) -> Result<Client, reqwest::Error> {
	debug!(timeout_ms = timeout.as_millis() as u64, "building HTTP client");
	builder().timeout(timeout).build()
}

/// Creates a new HTTP client builder with the standard User-Agent header and
/// connect timeout.
///
/// Use this when you need to customize the client further.
///
/// # Example
/// ```ignore
/// let client = loom_common_http::builder()
///     .timeout(Duration::from_secs(5))
///     .build()?;
/// ```
pub fn builder() -> ClientBuilder {
	builder_with_user_agent(user_agent())
}

/// Creates a new HTTP client builder with a custom User-Agent header.
pub fn builder_with_user_agent(user_agent: impl Into<String>) -> ClientBuilder {
	Client::builder()
		.user_agent(user_agent.into())
		.connect_timeout(DEFAULT_CONNECT_TIMEOUT)
}

/// Returns the standard User-Agent string.
///
/// Format: `loom-acs/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"loom-acs/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}
