// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory server connection section.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::secret::SecretString;

fn default_user_id_field() -> String {
	"uid".to_string()
}

/// Configuration layer for the directory server (all fields optional for layering).
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct DirectoryConfigLayer {
	/// `ldap://` or `ldaps://` URL.
	pub url: Option<String>,
	/// Search base for user lookups and recursive membership queries.
	pub base_dn: Option<String>,
	/// Administrative bind DN.
	pub admin_user: Option<String>,
	pub admin_pass: Option<SecretString>,
	pub start_tls: Option<bool>,
	/// Attribute holding the login name.
	pub user_id_field: Option<String>,
	/// Extra RFC 4515 filter ANDed into user lookups.
	pub user_filter: Option<String>,
}

impl DirectoryConfigLayer {
	pub fn merge(&mut self, other: DirectoryConfigLayer) {
		if other.url.is_some() {
			self.url = other.url;
		}
		if other.base_dn.is_some() {
			self.base_dn = other.base_dn;
		}
		if other.admin_user.is_some() {
			self.admin_user = other.admin_user;
		}
		if other.admin_pass.is_some() {
			self.admin_pass = other.admin_pass;
		}
		if other.start_tls.is_some() {
			self.start_tls = other.start_tls;
		}
		if other.user_id_field.is_some() {
			self.user_id_field = other.user_id_field;
		}
		if other.user_filter.is_some() {
			self.user_filter = other.user_filter;
		}
	}

	pub fn is_configured(&self) -> bool {
		self.url.as_deref().is_some_and(|url| !url.trim().is_empty())
	}

	/// Returns `None` when no server URL is set.
	pub fn finalize(self) -> Result<Option<DirectoryConfig>, ConfigError> {
		if !self.is_configured() {
			return Ok(None);
		}

		let url = self.url.unwrap_or_default();
		if !(url.starts_with("ldap://") || url.starts_with("ldaps://")) {
			return Err(ConfigError::InvalidValue {
				key: "directory.url".to_string(),
				message: format!("expected an ldap:// or ldaps:// URL, got '{url}'"),
			});
		}

		let base_dn = self
			.base_dn
			.filter(|dn| !dn.trim().is_empty())
			.ok_or_else(|| {
				ConfigError::Validation("directory.base_dn is required when directory.url is set".to_string())
			})?;

		Ok(Some(DirectoryConfig {
			url,
			base_dn,
			admin_user: self.admin_user.filter(|dn| !dn.is_empty()),
			admin_pass: self.admin_pass,
			start_tls: self.start_tls.unwrap_or(false),
			user_id_field: self
				.user_id_field
				.filter(|f| !f.is_empty())
				.unwrap_or_else(default_user_id_field),
			user_filter: self.user_filter.filter(|f| !f.trim().is_empty()),
		}))
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryConfig {
	pub url: String,
	pub base_dn: String,
	pub admin_user: Option<String>,
	pub admin_pass: Option<SecretString>,
	pub start_tls: bool,
	pub user_id_field: String,
	pub user_filter: Option<String>,
}
