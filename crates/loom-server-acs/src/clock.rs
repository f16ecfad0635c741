// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Time source used for token deadlines.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of "now" in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
	fn now_ms(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now_ms(&self) -> u64 {
		chrono::Utc::now().timestamp_millis().max(0) as u64
	}
}

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
	now_ms: AtomicU64,
}

impl ManualClock {
	pub fn new(now_ms: u64) -> Self {
		Self {
			now_ms: AtomicU64::new(now_ms),
		}
	}

	pub fn set(&self, now_ms: u64) {
		self.now_ms.store(now_ms, Ordering::SeqCst);
	}

	pub fn advance_secs(&self, secs: u64) {
		self.now_ms.fetch_add(secs * 1000, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now_ms(&self) -> u64 {
		self.now_ms.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_system_clock_is_after_2020() {
		assert!(SystemClock.now_ms() > 1_577_836_800_000);
	}

	#[test]
	fn test_manual_clock_moves_on_demand() {
		let clock = ManualClock::new(1_000);
		assert_eq!(clock.now_ms(), 1_000);

		clock.advance_secs(2);
		assert_eq!(clock.now_ms(), 3_000);

		clock.set(10);
		assert_eq!(clock.now_ms(), 10);
	}
}
