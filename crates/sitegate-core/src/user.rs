// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory user records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Values of one directory attribute.
///
/// Directory clients disagree on whether a single-valued attribute comes back
/// as a scalar or a one-element list; both normalize to a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum AttributeValues {
	Single(String),
	Multi(Vec<String>),
}

impl AttributeValues {
	pub fn into_vec(self) -> Vec<String> {
		match self {
			AttributeValues::Single(value) => vec![value],
			AttributeValues::Multi(values) => values,
		}
	}
}

impl From<String> for AttributeValues {
	fn from(value: String) -> Self {
		AttributeValues::Single(value)
	}
}

impl From<&str> for AttributeValues {
	fn from(value: &str) -> Self {
		AttributeValues::Single(value.to_string())
	}
}

impl From<Vec<String>> for AttributeValues {
	fn from(values: Vec<String>) -> Self {
		AttributeValues::Multi(values)
	}
}

impl From<Vec<&str>> for AttributeValues {
	fn from(values: Vec<&str>) -> Self {
		AttributeValues::Multi(values.into_iter().map(str::to_string).collect())
	}
}

/// A user entry as returned by the directory.
///
/// Attribute names are stored lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawUserRecord")]
pub struct DirectoryUserRecord {
	dn: String,
	#[serde(flatten)]
	attributes: BTreeMap<String, Vec<String>>,
}

#[derive(Deserialize)]
struct RawUserRecord {
	dn: String,
	#[serde(flatten)]
	attributes: BTreeMap<String, AttributeValues>,
}

impl From<RawUserRecord> for DirectoryUserRecord {
	fn from(raw: RawUserRecord) -> Self {
		raw.attributes
			.into_iter()
			.fold(DirectoryUserRecord::new(raw.dn), |record, (name, values)| {
				record.with_attribute(name, values)
			})
	}
}

impl DirectoryUserRecord {
	pub fn new(dn: impl Into<String>) -> Self {
		Self {
			dn: dn.into(),
			attributes: BTreeMap::new(),
		}
	}

	/// Adds values to an attribute, appending if the attribute already exists.
	pub fn with_attribute(mut self, name: impl AsRef<str>, values: impl Into<AttributeValues>) -> Self {
		self.insert_attribute(name, values);
		self
	}

	pub fn insert_attribute(&mut self, name: impl AsRef<str>, values: impl Into<AttributeValues>) {
		self
			.attributes
			.entry(name.as_ref().to_lowercase())
			.or_default()
			.extend(values.into().into_vec());
	}

	pub fn dn(&self) -> &str {
		&self.dn
	}

	/// Case-insensitive attribute lookup.
	pub fn attribute(&self, name: &str) -> Option<&[String]> {
		self
			.attributes
			.get(&name.to_lowercase())
			.map(Vec::as_slice)
	}

	pub fn attributes(&self) -> impl Iterator<Item = (&str, &[String])> {
		self
			.attributes
			.iter()
			.map(|(name, values)| (name.as_str(), values.as_slice()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn attribute_lookup_is_case_insensitive() {
		let record = DirectoryUserRecord::new("cn=jdoe,dc=org")
			.with_attribute("memberOf", vec!["cn=Admins,dc=org"]);

		assert_eq!(record.attribute("memberof").unwrap(), ["cn=Admins,dc=org"]);
		assert_eq!(record.attribute("MEMBEROF").unwrap(), ["cn=Admins,dc=org"]);
		assert!(record.attribute("mail").is_none());
	}

	#[test]
	fn single_value_normalizes_to_sequence() {
		let record = DirectoryUserRecord::new("cn=jdoe,dc=org").with_attribute("memberOf", "cn=Admins,dc=org");
		assert_eq!(record.attribute("memberof").unwrap().len(), 1);
	}

	#[test]
	fn repeated_attribute_appends() {
		let record = DirectoryUserRecord::new("cn=jdoe,dc=org")
			.with_attribute("memberOf", "cn=A,dc=org")
			.with_attribute("MemberOf", vec!["cn=B,dc=org", "cn=C,dc=org"]);
		assert_eq!(
			record.attribute("memberof").unwrap(),
			["cn=A,dc=org", "cn=B,dc=org", "cn=C,dc=org"]
		);
	}

	mod serde_format {
		use super::*;

		#[test]
		fn deserializes_scalars_and_lists() {
			let json = r#"{
				"dn": "cn=jdoe,ou=Users,dc=org",
				"memberOf": "cn=Admins,dc=org",
				"mail": ["jdoe@org.example", "john@org.example"]
			}"#;
			let record: DirectoryUserRecord = serde_json::from_str(json).unwrap();

			assert_eq!(record.dn(), "cn=jdoe,ou=Users,dc=org");
			assert_eq!(record.attribute("memberof").unwrap(), ["cn=Admins,dc=org"]);
			assert_eq!(record.attribute("mail").unwrap().len(), 2);
		}

		#[test]
		fn missing_dn_is_rejected() {
			let json = r#"{"memberOf": "cn=Admins,dc=org"}"#;
			assert!(serde_json::from_str::<DirectoryUserRecord>(json).is_err());
		}

		#[test]
		fn serializes_lowercased_names() {
			let record = DirectoryUserRecord::new("cn=jdoe,dc=org").with_attribute("memberOf", "cn=A,dc=org");
			let json = serde_json::to_value(&record).unwrap();
			assert_eq!(
				json,
				serde_json::json!({"dn": "cn=jdoe,dc=org", "memberof": ["cn=A,dc=org"]})
			);
		}
	}
}
