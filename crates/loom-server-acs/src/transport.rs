// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! The HTTP capability the ACS client talks through.
//!
//! [`HttpTransport`] is the only way the token fetcher and decision client
//! reach the network. [`ReqwestTransport`] is the production implementation;
//! tests substitute their own.

use std::time::Duration;

use async_trait::async_trait;
use http::Method;
use loom_common_secret::SecretString;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::TransportFailure;

/// Credentials attached to an outgoing request.
#[derive(Debug, Clone)]
pub enum HttpAuth {
	Basic {
		username: String,
		password: SecretString,
	},
	Bearer(SecretString),
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpBody {
	/// `application/x-www-form-urlencoded`
	Form(Vec<(String, String)>),
	/// `application/json`
	Json(serde_json::Value),
}

/// A transport-neutral HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
	pub method: Method,
	pub url: String,
	pub headers: Vec<(String, String)>,
	pub auth: Option<HttpAuth>,
	pub body: Option<HttpBody>,
}

impl HttpRequest {
	pub fn new(method: Method, url: impl Into<String>) -> Self {
		Self {
			method,
			url: url.into(),
			headers: Vec::new(),
			auth: None,
			body: None,
		}
	}

	pub fn get(url: impl Into<String>) -> Self {
		Self::new(Method::GET, url)
	}

	pub fn post(url: impl Into<String>) -> Self {
		Self::new(Method::POST, url)
	}

	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));
		self
	}

	pub fn basic_auth(mut self, username: impl Into<String>, password: SecretString) -> Self {
		self.auth = Some(HttpAuth::Basic {
			username: username.into(),
			password,
		});
		self
	}

	pub fn bearer_auth(mut self, token: SecretString) -> Self {
		self.auth = Some(HttpAuth::Bearer(token));
		self
	}

	pub fn form(mut self, pairs: &[(&str, &str)]) -> Self {
		self.body = Some(HttpBody::Form(
			pairs
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect(),
		));
		self
	}

	pub fn json(mut self, body: serde_json::Value) -> Self {
		self.body = Some(HttpBody::Json(body));
		self
	}

	/// Value of the first header with this name (case-insensitive).
	pub fn header_value(&self, name: &str) -> Option<&str> {
		self
			.headers
			.iter()
			.find(|(k, _)| k.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
	pub status: u16,
	pub body: String,
}

impl HttpResponse {
	pub fn new(status: u16, body: impl Into<String>) -> Self {
		Self {
			status,
			body: body.into(),
		}
	}

	pub fn is_ok(&self) -> bool {
		self.status == 200
	}

	pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
		serde_json::from_str(&self.body)
	}
}

/// Performs HTTP exchanges on behalf of the ACS client.
///
/// Implementations report only transport-level failures; any status code is
/// a successful exchange.
#[async_trait]
pub trait HttpTransport: Send + Sync {
	async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure>;
}

/// [`HttpTransport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
	client: Client,
}

impl ReqwestTransport {
	/// Build a transport using the shared Loom HTTP client settings.
	pub fn new(timeout: Duration) -> Result<Self, TransportFailure> {
		let client = loom_common_http::new_client_with_timeout(timeout)?;
		Ok(Self { client })
	}
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
	async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
		debug!(method = %request.method, url = %request.url, "sending request");

		let mut builder = self.client.request(request.method, &request.url);

		for (name, value) in &request.headers {
			builder = builder.header(name.as_str(), value.as_str());
		}

		builder = match request.auth {
			Some(HttpAuth::Basic { username, password }) => {
				builder.basic_auth(username, Some(password.expose()))
			}
			Some(HttpAuth::Bearer(token)) => builder.bearer_auth(token.expose()),
			None => builder,
		};

		builder = match request.body {
			Some(HttpBody::Form(pairs)) => builder.form(&pairs),
			Some(HttpBody::Json(value)) => builder.json(&value),
			None => builder,
		};

		let response = builder.send().await?;
		let status = response.status().as_u16();
		let body = response.text().await?;

		trace!(status, body_len = body.len(), "received response");
		Ok(HttpResponse { status, body })
	}
}
