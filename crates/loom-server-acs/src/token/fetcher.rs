// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Client-credentials grant against the UAA token endpoint.

use std::sync::Arc;

use loom_common_secret::SecretString;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

use crate::clock::Clock;
use crate::config::AcsConfig;
use crate::error::TokenError;
use crate::token::CachedToken;
use crate::transport::{HttpRequest, HttpTransport};

const GRANT_TYPE: &str = "client_credentials";

/// Successful token response. Extra fields (`token_type`, `scope`, `jti`)
/// are ignored.
#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_in: u64,
}

/// Obtains fresh tokens from UAA. Never retries.
#[derive(Clone)]
pub struct TokenFetcher {
	transport: Arc<dyn HttpTransport>,
	clock: Arc<dyn Clock>,
	token_uri: String,
	client_id: String,
	client_secret: SecretString,
	renew_secs_before: u64,
}

impl TokenFetcher {
	pub fn new(config: &AcsConfig, transport: Arc<dyn HttpTransport>, clock: Arc<dyn Clock>) -> Self {
		Self {
			transport,
			clock,
			token_uri: config.uaa().uri().to_string(),
			client_id: config.uaa().client_id().to_string(),
			client_secret: config.uaa().client_secret().clone(),
			renew_secs_before: config.renew_secs_before(),
		}
	}

	/// Request a new token.
	///
	/// Deadlines are computed from the moment the request started, so a slow
	/// response shortens the usable window rather than extending it.
	#[instrument(skip(self), fields(token_uri = %self.token_uri, client_id = %self.client_id))]
	pub async fn fetch(&self) -> Result<CachedToken, TokenError> {
		let issued_at = self.clock.now_ms();
		debug!("fetching new token");

		let request = HttpRequest::post(&self.token_uri)
			.header("cache-control", "no-cache")
			.header("content-type", "application/x-www-form-urlencoded")
			.basic_auth(&self.client_id, self.client_secret.clone())
			.form(&[("grant_type", GRANT_TYPE)]);

		let response = self.transport.execute(request).await.map_err(|e| {
			error!(error = %e, "error getting token");
			TokenError::from(e)
		})?;

		if !response.is_ok() {
			error!(status = response.status, "token request rejected");
			return Err(TokenError::Status {
				status: response.status,
				body: response.body,
			});
		}

		let token: TokenResponse = response.json().map_err(|e| {
			error!(error = %e, "failed to parse token response");
			TokenError::InvalidResponse(format!("JSON parse error: {e}"))
		})?;

		if token.access_token.is_empty() {
			return Err(TokenError::InvalidResponse(
				"access_token is empty".to_string(),
			));
		}

		info!(expires_in = token.expires_in, "fetched new token");

		Ok(CachedToken::new(
			SecretString::new(token.access_token),
			issued_at,
			token.expires_in,
			self.renew_secs_before,
		))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;
	use crate::error::TransportFailure;
	use crate::test_support::{test_config, token_body, MockTransport};
	use crate::transport::{HttpAuth, HttpBody, HttpResponse};
	use tokio_test::{assert_pending, assert_ready_ok};

	fn fetcher(transport: Arc<MockTransport>, clock: Arc<ManualClock>) -> TokenFetcher {
		TokenFetcher::new(&test_config(), transport, clock)
	}

	#[tokio::test]
	async fn test_fetch_sends_client_credentials_grant() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		let clock = Arc::new(ManualClock::new(1_000_000));

		fetcher(transport.clone(), clock).fetch().await.unwrap();

		let requests = transport.requests();
		assert_eq!(requests.len(), 1);
		let request = &requests[0];
		assert_eq!(request.method, http::Method::POST);
		assert_eq!(request.url, "https://uaa.example.com/oauth/token");
		assert_eq!(
			request.header_value("content-type"),
			Some("application/x-www-form-urlencoded")
		);
		match &request.auth {
			Some(HttpAuth::Basic { username, password }) => {
				assert_eq!(username, "test-client");
				assert_eq!(password.expose(), "test-secret");
			}
			other => panic!("expected basic auth, got {other:?}"),
		}
		assert_eq!(
			request.body,
			Some(HttpBody::Form(vec![(
				"grant_type".to_string(),
				"client_credentials".to_string()
			)]))
		);
	}

	#[tokio::test]
	async fn test_fetch_computes_deadlines_from_request_start() {
		let transport = Arc::new(MockTransport::gated());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		let clock = Arc::new(ManualClock::new(5_000));
		let fetcher = fetcher(transport.clone(), clock.clone());

		let mut fetch = tokio_test::task::spawn(fetcher.fetch());
		assert_pending!(fetch.poll());
		assert_eq!(transport.call_count(), 1);

		// The response arrives ten seconds after the request went out.
		clock.advance_secs(10);
		transport.release(1);

		let token = assert_ready_ok!(fetch.poll());
		assert_eq!(token.value().expose(), "tok-1");
		assert_eq!(token.expire_at(), 5_000 + 3_600_000);
		assert_eq!(token.renew_at(), 5_000 + 3_540_000);
	}

	#[tokio::test]
	async fn test_non_200_is_status_error() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(401, "bad credentials"));

		let err = fetcher(transport, Arc::new(ManualClock::new(1)))
			.fetch()
			.await
			.unwrap_err();

		assert_eq!(
			err,
			TokenError::Status {
				status: 401,
				body: "bad credentials".to_string()
			}
		);
	}

	#[tokio::test]
	async fn test_transport_failure_is_surfaced() {
		let transport = Arc::new(MockTransport::new());
		transport.push_failure(TransportFailure::Network("connection refused".to_string()));

		let err = fetcher(transport, Arc::new(ManualClock::new(1)))
			.fetch()
			.await
			.unwrap_err();

		assert!(matches!(err, TokenError::Transport(TransportFailure::Network(_))));
	}

	#[tokio::test]
	async fn test_missing_expires_in_is_invalid() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, r#"{"access_token": "tok"}"#));

		let err = fetcher(transport, Arc::new(ManualClock::new(1)))
			.fetch()
			.await
			.unwrap_err();

		assert!(matches!(err, TokenError::InvalidResponse(_)));
	}

	#[tokio::test]
	async fn test_empty_access_token_is_invalid() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, token_body("", 3600)));

		let err = fetcher(transport, Arc::new(ManualClock::new(1)))
			.fetch()
			.await
			.unwrap_err();

		assert!(matches!(err, TokenError::InvalidResponse(_)));
	}
}
