// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights
// reserved. SPDX-License-Identifier: Proprietary

//! Wire types for the ACS policy-evaluation and subject APIs.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A subject or resource attribute as exchanged with ACS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
	pub issuer: String,
	pub name: String,
	pub value: String,
	/// Attribute scopes; ACS usually sends `null`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub scopes: Option<serde_json::Value>,
}

impl Attribute {
	pub fn new(issuer: impl Into<String>, name: impl Into<String>, value: impl Into<String>) -> Self {
		Self {
			issuer: issuer.into(),
			name: name.into(),
			value: value.into(),
			scopes: None,
		}
	}
}

/// Outcome of a policy evaluation.
///
/// Only [`Effect::Permit`] grants access. Values ACS may add in future are
/// preserved in [`Effect::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Effect {
	Permit,
	Deny,
	NotApplicable,
	Indeterminate,
	Other(String),
}

impl Effect {
	pub fn as_str(&self) -> &str {
		match self {
			Effect::Permit => "PERMIT",
			Effect::Deny => "DENY",
			Effect::NotApplicable => "NOT_APPLICABLE",
			Effect::Indeterminate => "INDETERMINATE",
			Effect::Other(value) => value,
		}
	}

	pub fn is_permit(&self) -> bool {
		matches!(self, Effect::Permit)
	}
}

impl From<String> for Effect {
	fn from(value: String) -> Self {
		match value.as_str() {
			"PERMIT" => Effect::Permit,
			"DENY" => Effect::Deny,
			"NOT_APPLICABLE" => Effect::NotApplicable,
			"INDETERMINATE" => Effect::Indeterminate,
			_ => Effect::Other(value),
		}
	}
}

impl From<Effect> for String {
	fn from(effect: Effect) -> Self {
		match effect {
			Effect::Other(value) => value,
			other => other.as_str().to_string(),
		}
	}
}

impl fmt::Display for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Policy-evaluation response from ACS.
///
/// Only `effect` is interpreted. Every other field is kept exactly as ACS
/// sent it, so a verdict round-trips to its original JSON shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
	pub effect: Effect,
	#[serde(flatten)]
	pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Verdict {
	pub fn new(effect: Effect) -> Self {
		Self {
			effect,
			fields: serde_json::Map::new(),
		}
	}

	pub fn is_permit(&self) -> bool {
		self.effect.is_permit()
	}

	/// A field of the verdict other than `effect`.
	pub fn field(&self, name: &str) -> Option<&serde_json::Value> {
		self.fields.get(name)
	}

	pub fn subject_attributes(&self) -> Option<&[serde_json::Value]> {
		self.array("subjectAttributes")
	}

	pub fn resource_attributes(&self) -> Option<&[serde_json::Value]> {
		self.array("resourceAttributes")
	}

	/// Resource URIs ACS matched against; non-string entries are skipped.
	pub fn resolved_resource_uris(&self) -> Vec<&str> {
		self
			.array("resolvedResourceUris")
			.unwrap_or_default()
			.iter()
			.filter_map(serde_json::Value::as_str)
			.collect()
	}

	/// Evaluation time in milliseconds since epoch.
	pub fn timestamp(&self) -> Option<i64> {
		self.field("timestamp").and_then(serde_json::Value::as_i64)
	}

	fn array(&self, name: &str) -> Option<&[serde_json::Value]> {
		self.field(name)
			.and_then(serde_json::Value::as_array)
			.map(Vec::as_slice)
	}
}

/// Subject record returned by `GET /v1/subject/{id}`.
///
/// Attributes are kept as received; fields other than the identifier and
/// attributes are preserved in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectAttributes {
	#[serde(default)]
	pub subject_identifier: String,
	#[serde(default)]
	pub attributes: Vec<serde_json::Value>,
	#[serde(flatten)]
	pub extra: serde_json::Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use serde_json::json;

	#[test]
	fn test_effect_parses_known_values() {
		assert_eq!(Effect::from("PERMIT".to_string()), Effect::Permit);
		assert_eq!(Effect::from("DENY".to_string()), Effect::Deny);
		assert_eq!(
			Effect::from("NOT_APPLICABLE".to_string()),
			Effect::NotApplicable
		);
		assert_eq!(
			Effect::from("INDETERMINATE".to_string()),
			Effect::Indeterminate
		);
	}

	#[test]
	fn test_effect_is_case_sensitive() {
		let effect = Effect::from("permit".to_string());
		assert_eq!(effect, Effect::Other("permit".to_string()));
		assert!(!effect.is_permit());
	}

	#[test]
	fn test_unknown_effect_round_trips() {
		let effect: Effect = serde_json::from_value(json!("MAYBE")).unwrap();
		assert_eq!(effect.as_str(), "MAYBE");
		assert_eq!(serde_json::to_value(&effect).unwrap(), json!("MAYBE"));
	}

	#[test]
	fn test_verdict_deserializes_full_permit() {
		let body = json!({
			"effect": "PERMIT",
			"subjectAttributes": [
				{"issuer": "https://acs.attributes.int", "name": "role", "value": "APP_USER", "scopes": null}
			],
			"resourceAttributes": [
				{"issuer": "https://acs.attributes.int", "name": "role", "value": "APP_USER", "scopes": null}
			],
			"resolvedResourceUris": ["/abc/def"],
			"timestamp": 1461451401499_i64
		});

		let verdict: Verdict = serde_json::from_value(body.clone()).unwrap();
		assert!(verdict.is_permit());
		assert_eq!(verdict.subject_attributes().unwrap()[0]["value"], "APP_USER");
		assert_eq!(verdict.resource_attributes().unwrap().len(), 1);
		assert_eq!(verdict.resolved_resource_uris(), vec!["/abc/def"]);
		assert_eq!(verdict.timestamp(), Some(1461451401499));
		assert_eq!(serde_json::to_value(&verdict).unwrap(), body);
	}

	#[test]
	fn test_verdict_tolerates_irregular_fields() {
		let body = json!({
			"effect": "PERMIT",
			"subjectAttributes": [{"name": "role", "value": 7}],
			"policySetId": "ps-1",
			"timestamp": "not-a-number"
		});

		let verdict: Verdict = serde_json::from_value(body.clone()).unwrap();
		assert!(verdict.is_permit());
		assert_eq!(verdict.field("policySetId"), Some(&json!("ps-1")));
		assert_eq!(verdict.subject_attributes().unwrap()[0], json!({"name": "role", "value": 7}));
		assert_eq!(verdict.timestamp(), None);
		assert!(verdict.resolved_resource_uris().is_empty());
		assert_eq!(serde_json::to_value(&verdict).unwrap(), body);
	}

	#[test]
	fn test_verdict_requires_effect() {
		let result: Result<Verdict, _> = serde_json::from_value(json!({"timestamp": 1}));
		assert!(result.is_err());
	}

	#[test]
	fn test_subject_attributes_keeps_extra_fields() {
		let body = json!({
			"subjectIdentifier": "bob",
			"attributes": [{"issuer": "UAA", "name": "group", "value": "admins"}],
			"parents": []
		});

		let subject: SubjectAttributes = serde_json::from_value(body).unwrap();
		assert_eq!(subject.subject_identifier, "bob");
		assert_eq!(subject.attributes.len(), 1);
		assert_eq!(subject.extra.get("parents"), Some(&json!([])));
	}

	#[test]
	fn test_subject_attributes_tolerate_partial_records() {
		let body = json!({
			"attributes": [{"name": "role"}, "opaque"]
		});

		let subject: SubjectAttributes = serde_json::from_value(body).unwrap();
		assert!(subject.subject_identifier.is_empty());
		assert_eq!(subject.attributes[1], json!("opaque"));
	}
}
