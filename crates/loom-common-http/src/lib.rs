// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for Loom.
//!
//! Every outbound client built here carries the same User-Agent and a bounded
//! request timeout. There are no retries; callers own retry policy.

mod client;

pub use client::{
	builder, builder_with_user_agent, new_client, new_client_with_timeout, user_agent,
	DEFAULT_CONNECT_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};
