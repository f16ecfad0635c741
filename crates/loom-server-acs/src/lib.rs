// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Attribute-based access control (ACS) client for Loom.
//!
//! [`AcsClient`] asks an ACS policy-evaluation service whether a subject may
//! perform an action on a resource. It authenticates with a UAA
//! client-credentials token that [`TokenCache`] acquires, caches, and renews
//! ahead of expiry, so decision calls never go out without a valid token and
//! never wait on a renewal while the current token is still usable.
//!
//! ```ignore
//! use loom_server_acs::{config::load_config, AcsClient};
//!
//! let client = AcsClient::new(load_config(None)?)?;
//! match client.authorize_http_request(&request, "alice", Some(&scopes)).await {
//!     Ok(verdict) => { /* permitted */ }
//!     Err(e) if e.is_denied() => { /* explicitly denied */ }
//!     Err(e) => { /* could not determine */ }
//! }
//! ```

pub mod client;
pub mod clock;
pub mod config;
pub mod error;
pub mod request;
pub mod token;
pub mod transport;
pub mod types;

#[cfg(test)]
mod test_support;

pub use client::AcsClient;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{load_config, load_config_from_env, AcsConfig, ConfigError};
pub use error::{AcsError, TokenError, TransportFailure, ValidationError};
pub use request::{AbacRequest, GroupMatcher, RequestTarget};
pub use token::{CachedToken, TokenCache, TokenFetcher};
pub use transport::{HttpAuth, HttpBody, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use types::{Attribute, Effect, SubjectAttributes, Verdict};
