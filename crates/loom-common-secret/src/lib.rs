// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Secret wrapper type for Loom.
//!
//! [`Secret<T>`] holds a sensitive value (client secrets, bearer tokens) and
//! makes it hard to leak by accident:
//!
//! - `Debug` and `Display` always render [`REDACTED`], so `?secret` and
//!   `%secret` in `tracing` fields are safe.
//! - `Serialize` writes [`REDACTED`] instead of the value.
//! - The inner value is zeroized when the wrapper is dropped.
//!
//! Call [`Secret::expose`] at the single point where the real value is needed
//! (e.g. building an `Authorization` header).

use std::fmt;

use zeroize::Zeroize;

/// Placeholder rendered in place of a secret value.
pub const REDACTED: &str = "[REDACTED]";

/// A value that must never appear in logs or serialized output.
pub struct Secret<T: Zeroize> {
	inner: T,
}

/// The common case: a secret string.
pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	/// Wrap a sensitive value.
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	/// Access the wrapped value.
	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl Secret<String> {
	/// True when the wrapped string is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.inner.trim().is_empty()
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.inner.zeroize();
	}
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
	fn clone(&self) -> Self {
		Self::new(self.inner.clone())
	}
}

impl<T: Zeroize + PartialEq> PartialEq for Secret<T> {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T: Zeroize + Eq> Eq for Secret<T> {}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Self::new(value)
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Self::new(value.to_string())
	}
}

#[cfg(feature = "serde")]
impl<T: Zeroize> serde::Serialize for Secret<T> {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		serializer.serialize_str(REDACTED)
	}
}

#[cfg(feature = "serde")]
impl<'de, T: Zeroize + serde::Deserialize<'de>> serde::Deserialize<'de> for Secret<T> {
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		T::deserialize(deserializer).map(Secret::new)
	}
}
