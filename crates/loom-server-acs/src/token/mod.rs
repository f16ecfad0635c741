// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! UAA client-credentials token lifecycle.
//!
//! [`TokenFetcher`] performs the round trip to the authorization server and
//! [`TokenCache`] decides when that round trip is needed.

mod cache;
mod fetcher;

pub use cache::TokenCache;
pub use fetcher::TokenFetcher;

use loom_common_secret::SecretString;

/// A bearer token together with its two deadlines.
///
/// `renew_at` is strictly before `expire_at` whenever the token was issued
/// with a positive renewal buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
	value: SecretString,
	expire_at: u64,
	renew_at: u64,
}

impl CachedToken {
	/// Build a token issued at `issued_at_ms` that lives `expires_in_secs`.
	pub fn new(
		value: SecretString,
		issued_at_ms: u64,
		expires_in_secs: u64,
		renew_secs_before: u64,
	) -> Self {
		let expire_at = issued_at_ms.saturating_add(expires_in_secs.saturating_mul(1000));
		let renew_at = expire_at.saturating_sub(renew_secs_before.saturating_mul(1000));
		Self {
			value,
			expire_at,
			renew_at,
		}
	}

	pub fn value(&self) -> &SecretString {
		&self.value
	}

	/// Milliseconds since epoch after which the token must not be used.
	pub fn expire_at(&self) -> u64 {
		self.expire_at
	}

	/// Milliseconds since epoch after which a renewal should start.
	pub fn renew_at(&self) -> u64 {
		self.renew_at
	}

	pub fn is_usable_at(&self, now_ms: u64) -> bool {
		now_ms < self.expire_at
	}

	pub fn needs_renewal_at(&self, now_ms: u64) -> bool {
		now_ms >= self.renew_at
	}
}
