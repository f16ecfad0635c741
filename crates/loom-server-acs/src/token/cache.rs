// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Single-slot token cache with background renewal.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, instrument, warn};

use crate::clock::Clock;
use crate::error::TokenError;
use crate::token::{CachedToken, TokenFetcher};

type PendingFetch = Shared<BoxFuture<'static, Result<CachedToken, TokenError>>>;

#[derive(Default)]
struct CacheState {
	token: Option<CachedToken>,
	pending: Option<PendingFetch>,
	last_failure: Option<TokenError>,
}

enum Lookup {
	/// Cached token is valid and not yet due for renewal.
	Fresh(CachedToken),
	/// Cached token is valid; a renewal has been started in the background.
	Renewing(CachedToken),
	/// Nothing usable; wait for the fetch.
	Miss(PendingFetch),
}

/// Holds one UAA token and renews it before it expires.
///
/// Callers holding a still-valid token are never blocked by a renewal. Only a
/// cold or expired cache makes callers wait, and then every concurrent caller
/// waits on the same fetch: at most one token request is in flight per cache.
///
/// Clones share the same slot.
#[derive(Clone)]
pub struct TokenCache {
	fetcher: Arc<TokenFetcher>,
	clock: Arc<dyn Clock>,
	state: Arc<Mutex<CacheState>>,
}

impl TokenCache {
	pub fn new(fetcher: TokenFetcher, clock: Arc<dyn Clock>) -> Self {
		Self {
			fetcher: Arc::new(fetcher),
			clock,
			state: Arc::new(Mutex::new(CacheState::default())),
		}
	}

	/// Return a token that is valid right now, fetching one if necessary.
	#[instrument(skip(self))]
	pub async fn acquire(&self) -> Result<String, TokenError> {
		let now = self.clock.now_ms();

		let lookup = {
			let mut state = lock(&self.state);
			match state.token.clone() {
				Some(token) if !token.needs_renewal_at(now) => Lookup::Fresh(token),
				Some(token) if token.is_usable_at(now) => {
					// The spawned task finishes the renewal; nobody waits on it here.
					drop(self.start_fetch(&mut state));
					Lookup::Renewing(token)
				}
				_ => Lookup::Miss(self.start_fetch(&mut state)),
			}
		};

		match lookup {
			Lookup::Fresh(token) => Ok(token.value().expose().clone()),
			Lookup::Renewing(token) => {
				debug!(renew_at = token.renew_at(), "token due for renewal, using cached token");
				Ok(token.value().expose().clone())
			}
			Lookup::Miss(pending) => {
				debug!("no usable token, waiting for fetch");
				let token = pending.await?;
				Ok(token.value().expose().clone())
			}
		}
	}

	/// Fetch a new token regardless of the cached one and wait for it.
	///
	/// Joins a fetch that is already in flight instead of starting another.
	pub async fn refresh(&self) -> Result<String, TokenError> {
		let pending = {
			let mut state = lock(&self.state);
			self.start_fetch(&mut state)
		};
		let token = pending.await?;
		Ok(token.value().expose().clone())
	}

	/// The cached token record, if any.
	pub fn snapshot(&self) -> Option<CachedToken> {
		lock(&self.state).token.clone()
	}

	/// The most recent fetch failure not yet superseded by a success.
	///
	/// Background renewal failures are not returned to any caller; this is
	/// where they can be observed.
	pub fn last_failure(&self) -> Option<TokenError> {
		lock(&self.state).last_failure.clone()
	}

	/// True while a token request is in flight.
	pub fn is_fetching(&self) -> bool {
		lock(&self.state).pending.is_some()
	}

	/// Join the in-flight fetch or start a new one.
	///
	/// The fetch runs on its own task so a background renewal completes even
	/// when no caller awaits it. The task publishes its result and clears the
	/// pending slot under the same lock, so `pending` is only ever cleared by
	/// the fetch it refers to.
	fn start_fetch(&self, state: &mut CacheState) -> PendingFetch {
		if let Some(pending) = &state.pending {
			return pending.clone();
		}

		let fetcher = Arc::clone(&self.fetcher);
		let shared_state = Arc::clone(&self.state);

		let handle = tokio::spawn(async move {
			let result = fetcher.fetch().await;

			let mut state = lock(&shared_state);
			state.pending = None;
			match &result {
				Ok(token) => {
					state.token = Some(token.clone());
					state.last_failure = None;
				}
				Err(e) => {
					warn!(error = %e, "token fetch failed");
					state.last_failure = Some(e.clone());
				}
			}
			result
		});

		let pending = async move {
			match handle.await {
				Ok(result) => result,
				Err(e) => Err(TokenError::TaskFailed(e.to_string())),
			}
		}
		.boxed()
		.shared();

		state.pending = Some(pending.clone());
		pending
	}

	#[cfg(test)]
	fn pending(&self) -> Option<PendingFetch> {
		lock(&self.state).pending.clone()
	}
}

fn lock(state: &Mutex<CacheState>) -> MutexGuard<'_, CacheState> {
	state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::clock::ManualClock;
	use crate::error::TransportFailure;
	use crate::test_support::{test_config, token_body, MockTransport};
	use crate::transport::HttpResponse;
	use tokio_test::{assert_pending, assert_ready_ok};

	fn cache(transport: &Arc<MockTransport>, clock: &Arc<ManualClock>) -> TokenCache {
		let fetcher = TokenFetcher::new(&test_config(), transport.clone(), clock.clone());
		TokenCache::new(fetcher, clock.clone())
	}

	async fn settle(cache: &TokenCache) {
		if let Some(pending) = cache.pending() {
			let _ = pending.await;
		}
	}

	#[tokio::test]
	async fn test_empty_cache_fetches_token() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		assert_eq!(cache.acquire().await.unwrap(), "tok-1");
		assert_eq!(transport.call_count(), 1);
		assert!(!cache.is_fetching());
		assert_eq!(cache.snapshot().unwrap().expire_at(), 1_000 + 3_600_000);
	}

	#[tokio::test]
	async fn test_fresh_token_issues_no_request() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		cache.acquire().await.unwrap();
		clock.advance_secs(3000);

		assert_eq!(cache.acquire().await.unwrap(), "tok-1");
		assert_eq!(cache.acquire().await.unwrap(), "tok-1");
		assert_eq!(transport.call_count(), 1);
	}

	#[tokio::test]
	async fn test_cold_acquire_waits_for_fetch() {
		let transport = Arc::new(MockTransport::gated());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		let mut acquire = tokio_test::task::spawn(cache.acquire());
		assert_pending!(acquire.poll());

		transport.release(1);
		settle(&cache).await;

		assert_eq!(assert_ready_ok!(acquire.poll()), "tok-1");
	}

	#[tokio::test]
	async fn test_renewal_returns_cached_token_without_waiting() {
		let transport = Arc::new(MockTransport::gated());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		transport.push_response(HttpResponse::new(200, token_body("tok-2", 3600)));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		transport.release(1);
		assert_eq!(cache.acquire().await.unwrap(), "tok-1");

		// Past renew_at (expire - 60s) but before expire_at.
		clock.advance_secs(3550);

		// The renewal request is gated, yet the caller gets the old token.
		assert_eq!(cache.acquire().await.unwrap(), "tok-1");
		assert!(cache.is_fetching());

		// A second caller during the renewal does not start another fetch.
		assert_eq!(cache.acquire().await.unwrap(), "tok-1");

		transport.release(1);
		settle(&cache).await;

		assert_eq!(transport.call_count(), 2);
		assert_eq!(cache.acquire().await.unwrap(), "tok-2");
		assert_eq!(transport.call_count(), 2);
	}

	#[tokio::test]
	async fn test_concurrent_cold_acquires_share_one_fetch() {
		let transport = Arc::new(MockTransport::gated());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		let handles: Vec<_> = (0..16)
			.map(|_| {
				let cache = cache.clone();
				tokio::spawn(async move { cache.acquire().await })
			})
			.collect();

		tokio::task::yield_now().await;
		transport.release(1);

		for handle in handles {
			assert_eq!(handle.await.unwrap().unwrap(), "tok-1");
		}
		assert_eq!(transport.call_count(), 1);
	}

	#[tokio::test]
	async fn test_concurrent_cold_failure_reaches_every_caller() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(500, "down"));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		let results = futures::future::join_all((0..4).map(|_| cache.acquire())).await;

		for result in results {
			assert!(matches!(result, Err(TokenError::Status { status: 500, .. })));
		}
		assert_eq!(transport.call_count(), 1);
		assert!(cache.last_failure().is_some());
	}

	#[tokio::test]
	async fn test_background_failure_is_swallowed_and_retried() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		transport.push_failure(TransportFailure::Timeout);
		transport.push_response(HttpResponse::new(200, token_body("tok-2", 3600)));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		cache.acquire().await.unwrap();
		clock.advance_secs(3550);

		assert_eq!(cache.acquire().await.unwrap(), "tok-1");
		settle(&cache).await;
		assert_eq!(
			cache.last_failure(),
			Some(TokenError::Transport(TransportFailure::Timeout))
		);

		// Still inside the renewal window: the next call tries again.
		assert_eq!(cache.acquire().await.unwrap(), "tok-1");
		settle(&cache).await;
		assert_eq!(transport.call_count(), 3);
		assert!(cache.last_failure().is_none());
		assert_eq!(cache.acquire().await.unwrap(), "tok-2");
	}

	#[tokio::test]
	async fn test_expired_token_waits_for_new_one() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		transport.push_response(HttpResponse::new(200, token_body("tok-2", 3600)));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		cache.acquire().await.unwrap();
		clock.advance_secs(3600);

		assert_eq!(cache.acquire().await.unwrap(), "tok-2");
	}

	#[tokio::test]
	async fn test_expired_token_fetch_failure_is_surfaced() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		transport.push_response(HttpResponse::new(401, "revoked"));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		cache.acquire().await.unwrap();
		clock.advance_secs(4000);

		let err = cache.acquire().await.unwrap_err();
		assert!(matches!(err, TokenError::Status { status: 401, .. }));
		// The failed fetch never overwrites the slot.
		assert_eq!(cache.snapshot().unwrap().value().expose(), "tok-1");
	}

	#[tokio::test]
	async fn test_refresh_forces_fetch() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		transport.push_response(HttpResponse::new(200, token_body("tok-2", 3600)));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);

		cache.acquire().await.unwrap();
		assert_eq!(cache.refresh().await.unwrap(), "tok-2");
		assert_eq!(cache.acquire().await.unwrap(), "tok-2");
		assert_eq!(transport.call_count(), 2);
	}

	#[tokio::test]
	async fn test_clones_share_the_slot() {
		let transport = Arc::new(MockTransport::new());
		transport.push_response(HttpResponse::new(200, token_body("tok-1", 3600)));
		let clock = Arc::new(ManualClock::new(1_000));
		let cache = cache(&transport, &clock);
		let other = cache.clone();

		cache.acquire().await.unwrap();
		assert_eq!(other.acquire().await.unwrap(), "tok-1");
		assert_eq!(transport.call_count(), 1);
	}
}
