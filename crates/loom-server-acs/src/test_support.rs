// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::config::{AcsConfig, AcsConfigLayer};
use crate::error::TransportFailure;
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};

/// Scripted transport that records every request.
///
/// A gated transport holds each request until [`release`](Self::release)
/// lets it through, so tests can observe callers while a fetch is in flight.
pub struct MockTransport {
	responses: Mutex<VecDeque<Result<HttpResponse, TransportFailure>>>,
	requests: Mutex<Vec<HttpRequest>>,
	calls: AtomicUsize,
	gate: Option<Semaphore>,
}

impl MockTransport {
	pub fn new() -> Self {
		Self {
			responses: Mutex::new(VecDeque::new()),
			requests: Mutex::new(Vec::new()),
			calls: AtomicUsize::new(0),
			gate: None,
		}
	}

	pub fn gated() -> Self {
		Self {
			gate: Some(Semaphore::new(0)),
			..Self::new()
		}
	}

	pub fn push_response(&self, response: HttpResponse) {
		self.responses.lock().unwrap().push_back(Ok(response));
	}

	pub fn push_failure(&self, failure: TransportFailure) {
		self.responses.lock().unwrap().push_back(Err(failure));
	}

	pub fn release(&self, n: usize) {
		if let Some(gate) = &self.gate {
			gate.add_permits(n);
		}
	}

	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn requests(&self) -> Vec<HttpRequest> {
		self.requests.lock().unwrap().clone()
	}
}

#[async_trait]
impl HttpTransport for MockTransport {
	async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportFailure> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.requests.lock().unwrap().push(request);

		if let Some(gate) = &self.gate {
			gate.acquire().await.unwrap().forget();
		}

		self
			.responses
			.lock()
			.unwrap()
			.pop_front()
			.unwrap_or_else(|| Err(TransportFailure::Network("no response queued".to_string())))
	}
}

pub fn test_config() -> AcsConfig {
	AcsConfigLayer::default()
		.with_uaa_uri("https://uaa.example.com/oauth/token")
		.with_client_id("test-client")
		.with_client_secret("test-secret")
		.with_acs_uri("https://acs.example.com")
		.with_zone_id("test-zone")
		.finalize()
		.unwrap()
}

pub fn token_body(access_token: &str, expires_in: u64) -> String {
	serde_json::json!({
		"access_token": access_token,
		"token_type": "bearer",
		"expires_in": expires_in,
		"scope": "acs.policies.read",
	})
	.to_string()
}
