// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The `[login_ldap]` section.
//!
//! Unlike the other sections this one is an open, ordered key/value table:
//! entitlement keys are named after site ids, so the set of keys is not known
//! up front. Values may be written as TOML strings, integers or booleans and
//! are kept as strings. Enumeration order is the order keys were first seen,
//! which is the order entitlements are evaluated in.

use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

use crate::entitlements::EntitlementConfiguration;
use crate::error::ConfigError;

pub const REQUIRED_MEMBER_OF_FIELD: &str = "required_member_of_field";
pub const LDAP_NETWORK_TIMEOUT: &str = "ldap_network_timeout";

const DEFAULT_MEMBER_OF_FIELD: &str = "memberOf";
const DEFAULT_NETWORK_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoginLdapConfigLayer {
	entries: Vec<(String, String)>,
}

impl LoginLdapConfigLayer {
	/// Sets `key`, replacing its value in place if it already exists.
	pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
		let key = key.into();
		let value = value.into();
		match self.entries.iter_mut().find(|(k, _)| *k == key) {
			Some(entry) => entry.1 = value,
			None => self.entries.push((key, value)),
		}
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self
			.entries
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	pub fn merge(&mut self, other: LoginLdapConfigLayer) {
		for (key, value) in other.entries {
			self.set(key, value);
		}
	}

	pub fn finalize(self) -> Result<LoginLdapConfig, ConfigError> {
		let required_member_of_field = self
			.get(REQUIRED_MEMBER_OF_FIELD)
			.map(str::trim)
			.filter(|field| !field.is_empty())
			.unwrap_or(DEFAULT_MEMBER_OF_FIELD)
			.to_string();

		let network_timeout = match self.get(LDAP_NETWORK_TIMEOUT).map(str::trim) {
			None | Some("") => Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS),
			Some(raw) => match raw.parse::<u64>() {
				Ok(secs) if secs > 0 => Duration::from_secs(secs),
				_ => {
					return Err(ConfigError::InvalidValue {
						key: format!("login_ldap.{LDAP_NETWORK_TIMEOUT}"),
						message: format!("expected a positive whole number of seconds, got '{raw}'"),
					})
				}
			},
		};

		Ok(LoginLdapConfig {
			required_member_of_field,
			network_timeout,
			entries: self.entries,
		})
	}
}

impl<'de> Deserialize<'de> for LoginLdapConfigLayer {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let table = toml::Table::deserialize(deserializer)?;
		let mut layer = LoginLdapConfigLayer::default();
		for (key, value) in table {
			let value = match value {
				toml::Value::String(s) => s,
				toml::Value::Integer(i) => i.to_string(),
				toml::Value::Boolean(b) => b.to_string(),
				other => {
					return Err(D::Error::custom(format!(
						"login_ldap.{key} must be a string, integer or boolean, got {}",
						other.type_str()
					)))
				}
			};
			layer.set(key, value);
		}
		Ok(layer)
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoginLdapConfig {
	/// Attribute on the user entry listing direct group memberships.
	pub required_member_of_field: String,
	/// Applied to every directory bind and search.
	pub network_timeout: Duration,
	entries: Vec<(String, String)>,
}

impl Default for LoginLdapConfig {
	fn default() -> Self {
		Self {
			required_member_of_field: DEFAULT_MEMBER_OF_FIELD.to_string(),
			network_timeout: Duration::from_secs(DEFAULT_NETWORK_TIMEOUT_SECS),
			entries: Vec::new(),
		}
	}
}

impl LoginLdapConfig {
	pub fn get(&self, key: &str) -> Option<&str> {
		self
			.entries
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	/// Every key/value in enumeration order.
	pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
		self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub fn entitlements(&self) -> EntitlementConfiguration {
		EntitlementConfiguration::load(self.entries())
	}
}
