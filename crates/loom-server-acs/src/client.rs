// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! ACS decision client.

use std::sync::Arc;

use loom_common_secret::SecretString;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, instrument, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{load_config_from_env, AcsConfig};
use crate::error::{AcsError, ValidationError};
use crate::request::{AbacRequest, GroupMatcher, RequestTarget};
use crate::token::{TokenCache, TokenFetcher};
use crate::transport::{HttpRequest, HttpTransport, ReqwestTransport};
use crate::types::{SubjectAttributes, Verdict};

const POLICY_EVALUATION_PATH: &str = "/v1/policy-evaluation";
const SUBJECT_PATH: &str = "/v1/subject";
const ZONE_HEADER: &str = "Predix-Zone-Id";

/// Asks ACS whether a subject may perform an action on a resource.
///
/// Every call carries a bearer token from the client's [`TokenCache`]; no
/// decision request is sent without one. Clones share the cache.
#[derive(Clone)]
pub struct AcsClient {
	transport: Arc<dyn HttpTransport>,
	tokens: TokenCache,
	groups: GroupMatcher,
	config: Arc<AcsConfig>,
}

impl AcsClient {
	/// Create a client using `reqwest` and the system clock.
	pub fn new(config: AcsConfig) -> Result<Self, AcsError> {
		let transport = ReqwestTransport::new(config.request_timeout())
			.map_err(|e| AcsError::transport(None, format!("failed to create HTTP client: {e}")))?;
		Ok(Self::with_parts(
			config,
			Arc::new(transport),
			Arc::new(SystemClock),
		))
	}

	/// Create a client from `LOOM_ACS_*` environment variables.
	pub fn from_env() -> Result<Self, AcsError> {
		Self::new(load_config_from_env()?)
	}

	/// Create a client with an explicit transport and clock.
	pub fn with_parts(
		config: AcsConfig,
		transport: Arc<dyn HttpTransport>,
		clock: Arc<dyn Clock>,
	) -> Self {
		let fetcher = TokenFetcher::new(&config, Arc::clone(&transport), Arc::clone(&clock));
		Self {
			tokens: TokenCache::new(fetcher, clock),
			groups: GroupMatcher::new(config.user_groups_regex().clone()),
			transport,
			config: Arc::new(config),
		}
	}

	/// The token cache backing this client.
	pub fn token_cache(&self) -> &TokenCache {
		&self.tokens
	}

	/// Evaluate `request` against the zone's policies.
	///
	/// Resolves with the verdict only when its effect is `PERMIT`. Any other
	/// effect is returned as [`AcsError::Denied`] carrying the verdict, which
	/// callers can tell apart from [`AcsError::Transport`] and
	/// [`AcsError::AuthServer`] failures.
	#[instrument(
		skip(self, request),
		fields(
			action = %request.action(),
			resource = %request.resource_identifier(),
			subject = %request.subject_identifier()
		)
	)]
	pub async fn authorize_request(&self, request: &AbacRequest) -> Result<Verdict, AcsError> {
		let body = serde_json::to_value(request)
			.map_err(|e| AcsError::transport(None, format!("failed to encode request: {e}")))?;

		let http_request = self
			.acs_request(HttpRequest::post(self.config.acs_endpoint(POLICY_EVALUATION_PATH)))
			.await?
			.json(body);

		let verdict: Verdict = self.send(http_request, "verdict").await?;

		if verdict.is_permit() {
			debug!("access permitted");
			Ok(verdict)
		} else {
			info!(effect = %verdict.effect, "access not permitted");
			Err(AcsError::Denied(Box::new(verdict)))
		}
	}

	/// Evaluate an HTTP request: its method is the action and its path the
	/// resource. Scopes matching the configured group pattern are sent as
	/// `group` subject attributes.
	pub async fn authorize_http_request<R: RequestTarget + ?Sized>(
		&self,
		request: &R,
		subject_identifier: &str,
		scopes: Option<&[String]>,
	) -> Result<Verdict, AcsError> {
		let abac = AbacRequest::for_http_request(request, subject_identifier, scopes, &self.groups)?;
		self.authorize_request(&abac).await
	}

	/// Fetch the attributes ACS holds for a subject.
	#[instrument(skip(self))]
	pub async fn get_subject_attributes(
		&self,
		subject_identifier: &str,
	) -> Result<SubjectAttributes, AcsError> {
		if subject_identifier.trim().is_empty() {
			return Err(ValidationError::new(vec!["subjectIdentifier"]).into());
		}

		let url = self.config.acs_endpoint(&format!(
			"{SUBJECT_PATH}/{}",
			urlencoding::encode(subject_identifier)
		));
		let http_request = self.acs_request(HttpRequest::get(url)).await?;

		self.send(http_request, "subject attributes").await
	}

	/// Attach the zone, cache and bearer headers.
	async fn acs_request(&self, request: HttpRequest) -> Result<HttpRequest, AcsError> {
		let token = self.tokens.acquire().await.map_err(|e| {
			warn!(error = %e, "no token available for ACS request");
			AcsError::from(e)
		})?;

		Ok(request
			.header(ZONE_HEADER, self.config.zone_id())
			.header("cache-control", "no-cache")
			.bearer_auth(SecretString::new(token)))
	}

	async fn send<T: DeserializeOwned>(&self, request: HttpRequest, what: &str) -> Result<T, AcsError> {
		let url = request.url.clone();
		let response = self.transport.execute(request).await.map_err(|e| {
			error!(url = %url, error = %e, "ACS request failed");
			AcsError::transport(None, e.to_string())
		})?;

		if !response.is_ok() {
			error!(url = %url, status = response.status, "ACS returned an error status");
			return Err(AcsError::transport(
				Some(response.status),
				format!("status {}", response.status),
			));
		}

		response.json().map_err(|e| {
			error!(url = %url, error = %e, "failed to parse ACS response");
			AcsError::transport(Some(response.status), format!("invalid {what} response: {e}"))
		})
	}
}

impl std::fmt::Debug for AcsClient {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("AcsClient")
			.field("acs_uri", &self.config.acs_uri())
			.field("zone_id", &self.config.zone_id())
			.finish_non_exhaustive()
	}
}
