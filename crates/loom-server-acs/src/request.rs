// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Policy-evaluation requests and their construction from HTTP requests.

use regex::Regex;
use serde::Serialize;

use crate::error::ValidationError;
use crate::types::Attribute;

/// Issuer of scope-derived group attributes.
pub const GROUP_ATTRIBUTE_ISSUER: &str = "UAA";

/// Name of scope-derived group attributes.
pub const GROUP_ATTRIBUTE_NAME: &str = "group";

/// A validated ABAC evaluation request.
///
/// Action, resource identifier and subject identifier are always non-blank;
/// see [`AbacRequest::new`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AbacRequest {
	action: String,
	resource_identifier: String,
	subject_identifier: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	subject_attributes: Option<Vec<Attribute>>,
}

impl AbacRequest {
	/// Validate and build a request. Every blank field is reported at once.
	pub fn new(
		action: impl Into<String>,
		resource_identifier: impl Into<String>,
		subject_identifier: impl Into<String>,
	) -> Result<Self, ValidationError> {
		let action = action.into();
		let resource_identifier = resource_identifier.into();
		let subject_identifier = subject_identifier.into();

		let missing: Vec<&'static str> = [
			("action", &action),
			("resourceIdentifier", &resource_identifier),
			("subjectIdentifier", &subject_identifier),
		]
		.into_iter()
		.filter(|(_, value)| value.trim().is_empty())
		.map(|(name, _)| name)
		.collect();

		if !missing.is_empty() {
			return Err(ValidationError::new(missing));
		}

		Ok(Self {
			action,
			resource_identifier,
			subject_identifier,
			subject_attributes: None,
		})
	}

	/// Attach subject attributes. An empty list leaves the request without
	/// a `subjectAttributes` key.
	pub fn with_subject_attributes(mut self, attributes: Vec<Attribute>) -> Self {
		self.subject_attributes = if attributes.is_empty() {
			None
		} else {
			Some(attributes)
		};
		self
	}

	/// Build a request from an HTTP request's method and path.
	///
	/// Each scope accepted by `groups` becomes a `group` subject attribute.
	pub fn for_http_request<R: RequestTarget + ?Sized>(
		request: &R,
		subject_identifier: impl Into<String>,
		scopes: Option<&[String]>,
		groups: &GroupMatcher,
	) -> Result<Self, ValidationError> {
		let abac = Self::new(request.action(), request.resource(), subject_identifier)?;
		let attributes = scopes
			.map(|scopes| groups.group_attributes(scopes))
			.unwrap_or_default();
		Ok(abac.with_subject_attributes(attributes))
	}

	pub fn action(&self) -> &str {
		&self.action
	}

	pub fn resource_identifier(&self) -> &str {
		&self.resource_identifier
	}

	pub fn subject_identifier(&self) -> &str {
		&self.subject_identifier
	}

	pub fn subject_attributes(&self) -> Option<&[Attribute]> {
		self.subject_attributes.as_deref()
	}
}

/// Something with an HTTP method and path.
pub trait RequestTarget {
	/// The method, used as the ABAC action.
	fn action(&self) -> &str;
	/// The path, used as the ABAC resource identifier.
	fn resource(&self) -> &str;
}

impl<B> RequestTarget for http::Request<B> {
	fn action(&self) -> &str {
		self.method().as_str()
	}

	fn resource(&self) -> &str {
		self.uri().path()
	}
}

impl RequestTarget for http::request::Parts {
	fn action(&self) -> &str {
		self.method.as_str()
	}

	fn resource(&self) -> &str {
		self.uri.path()
	}
}

/// Selects which token scopes are group memberships.
#[derive(Debug, Clone)]
pub struct GroupMatcher {
	pattern: Regex,
}

impl GroupMatcher {
	pub fn new(pattern: Regex) -> Self {
		Self { pattern }
	}

	/// Unanchored: the pattern may match anywhere in the scope.
	pub fn is_group(&self, scope: &str) -> bool {
		self.pattern.is_match(scope)
	}

	pub fn group_attributes(&self, scopes: &[String]) -> Vec<Attribute> {
		scopes
			.iter()
			.filter(|scope| self.is_group(scope))
			.map(|scope| Attribute::new(GROUP_ATTRIBUTE_ISSUER, GROUP_ATTRIBUTE_NAME, scope.as_str()))
			.collect()
	}
}
