// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry};
use sitegate_config::{DirectoryConfig, SecretString};
use sitegate_core::DirectoryUserRecord;
use sitegate_directory::{
	DirectoryEntry, DirectoryError, DirectoryQuery, Filter, FilterParser, SearchRequest,
};
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Connection settings for [`LdapDirectory`].
#[derive(Debug, Clone)]
pub struct LdapSettings {
	pub url: String,
	pub base_dn: String,
	pub bind_dn: Option<String>,
	pub bind_password: Option<SecretString>,
	pub start_tls: bool,
	pub user_id_field: String,
	pub user_filter: Option<Filter>,
	/// Connection and per-operation timeout.
	pub timeout: Duration,
}

impl LdapSettings {
	/// Builds settings from the `[directory]` section. Fails if `user_filter`
	/// is not a valid filter.
	pub fn from_config(config: &DirectoryConfig, timeout: Duration) -> Result<Self, DirectoryError> {
		let user_filter = config
			.user_filter
			.as_deref()
			.map(FilterParser::parse)
			.transpose()?;

		Ok(Self {
			url: config.url.clone(),
			base_dn: config.base_dn.clone(),
			bind_dn: config.admin_user.clone(),
			bind_password: config.admin_pass.clone(),
			start_tls: config.start_tls,
			user_id_field: config.user_id_field.clone(),
			user_filter,
			timeout,
		})
	}

	/// `(&(<user_id_field>=<login>)<user_filter>)`, or just the equality test
	/// without a user filter.
	pub fn user_lookup_filter(&self, login: &str) -> Filter {
		let by_login = Filter::eq(self.user_id_field.clone(), login);
		match &self.user_filter {
			Some(extra) => Filter::and([by_login, extra.clone()]),
			None => by_login,
		}
	}
}

/// A directory server reached over LDAP.
///
/// One connection is opened lazily and shared by all calls on this instance;
/// calls are serialized on it. A failed operation drops the connection so the
/// next call reconnects.
pub struct LdapDirectory {
	settings: LdapSettings,
	connection: Mutex<Option<Ldap>>,
}

impl LdapDirectory {
	pub fn new(settings: LdapSettings) -> Self {
		Self {
			settings,
			connection: Mutex::new(None),
		}
	}

	pub fn settings(&self) -> &LdapSettings {
		&self.settings
	}

	/// Looks a user up by login name. Binds as administrator first when
	/// credentials are configured, otherwise searches anonymously.
	pub async fn find_user(&self, login: &str) -> Result<Option<DirectoryUserRecord>, DirectoryError> {
		if self.settings.bind_dn.is_some() {
			self.bind_as_administrator().await?;
		}

		let request = SearchRequest::new(self.settings.base_dn.clone(), self.settings.user_lookup_filter(login));
		let mut entries = self.search(&request).await?;

		match entries.len() {
			0 => {
				debug!(login, "user not found");
				Ok(None)
			}
			1 => Ok(entries.pop().map(DirectoryEntry::into_user_record)),
			n => Err(DirectoryError::Search {
				base_dn: self.settings.base_dn.clone(),
				message: format!("login '{login}' matched {n} entries"),
			}),
		}
	}

	async fn connection(&self) -> Result<Ldap, DirectoryError> {
		let mut guard = self.connection.lock().await;
		if let Some(ldap) = guard.as_ref() {
			return Ok(ldap.clone());
		}

		let settings = LdapConnSettings::new()
			.set_conn_timeout(self.settings.timeout)
			.set_starttls(self.settings.start_tls);

		let (conn, ldap) = LdapConnAsync::with_settings(settings, &self.settings.url)
			.await
			.map_err(|e| DirectoryError::Connect {
				url: self.settings.url.clone(),
				message: e.to_string(),
			})?;

		let url = self.settings.url.clone();
		tokio::spawn(async move {
			if let Err(e) = conn.drive().await {
				warn!(url = %url, error = %e, "LDAP connection closed with error");
			}
		});

		debug!(url = %self.settings.url, start_tls = self.settings.start_tls, "LDAP connection established");
		*guard = Some(ldap.clone());
		Ok(ldap)
	}

	async fn reset(&self) {
		self.connection.lock().await.take();
	}
}

#[async_trait]
impl DirectoryQuery for LdapDirectory {
	async fn bind_as_administrator(&self) -> Result<(), DirectoryError> {
		let Some(bind_dn) = self.settings.bind_dn.as_deref() else {
			return Err(DirectoryError::Bind {
				bind_dn: String::new(),
				message: "no administrative bind DN configured".to_string(),
			});
		};
		let password = self
			.settings
			.bind_password
			.as_ref()
			.map(|p| p.expose().as_str())
			.unwrap_or_default();

		let bind_error = |message: String| DirectoryError::Bind {
			bind_dn: bind_dn.to_string(),
			message,
		};

		let mut ldap = self
			.connection()
			.await
			.map_err(|e| bind_error(e.to_string()))?;

		let result = async {
			ldap
				.with_timeout(self.settings.timeout)
				.simple_bind(bind_dn, password)
				.await?
				.success()
		}
		.await;

		if let Err(e) = result {
			self.reset().await;
			return Err(bind_error(e.to_string()));
		}
		debug!(bind_dn, "administrative bind succeeded");
		Ok(())
	}

	async fn search(&self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError> {
		let mut ldap = self.connection().await?;
		let filter = request.filter.to_string();

		let result = async {
			ldap
				.with_timeout(self.settings.timeout)
				.search(
					&request.base_dn,
					Scope::Subtree,
					&filter,
					request.attributes.clone(),
				)
				.await?
				.success()
		}
		.await;

		let (entries, _) = match result {
			Ok(found) => found,
			Err(e) => {
				self.reset().await;
				return Err(DirectoryError::Search {
					base_dn: request.base_dn.clone(),
					message: e.to_string(),
				});
			}
		};

		debug!(base_dn = %request.base_dn, filter = %filter, returned = entries.len(), "LDAP search complete");
		Ok(entries
			.into_iter()
			.map(SearchEntry::construct)
			.map(into_directory_entry)
			.collect())
	}
}

fn into_directory_entry(entry: SearchEntry) -> DirectoryEntry {
	entry
		.attrs
		.into_iter()
		.fold(DirectoryEntry::new(entry.dn), |acc, (name, values)| {
			acc.with_attribute(name, values)
		})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	fn config() -> DirectoryConfig {
		DirectoryConfig {
			url: "ldap://127.0.0.1:1".to_string(),
			base_dn: "dc=org,dc=com".to_string(),
			admin_user: Some("cn=admin,dc=org,dc=com".to_string()),
			admin_pass: None,
			start_tls: false,
			user_id_field: "sAMAccountName".to_string(),
			user_filter: Some("(objectClass=user)".to_string()),
		}
	}

	#[test]
	fn user_lookup_filter_includes_extra_filter() {
		let settings = LdapSettings::from_config(&config(), Duration::from_secs(5)).unwrap();
		assert_eq!(
			settings.user_lookup_filter("jdoe").to_string(),
			"(&(sAMAccountName=jdoe)(objectClass=user))"
		);
	}

	#[test]
	fn user_lookup_filter_escapes_login() {
		let settings = LdapSettings::from_config(
			&DirectoryConfig {
				user_filter: None,
				..config()
			},
			Duration::from_secs(5),
		)
		.unwrap();
		assert_eq!(
			settings.user_lookup_filter("*)(uid=*").to_string(),
			r"(sAMAccountName=\2a\29\28uid=\2a)"
		);
	}

	#[test]
	fn invalid_user_filter_is_rejected() {
		let result = LdapSettings::from_config(
			&DirectoryConfig {
				user_filter: Some("(objectClass=user".to_string()),
				..config()
			},
			Duration::from_secs(5),
		);
		assert!(matches!(result, Err(DirectoryError::InvalidFilter(_))));
	}

	#[test]
	fn search_entry_conversion_lowercases_names() {
		let mut attrs = HashMap::new();
		attrs.insert("memberOf".to_string(), vec!["cn=A,dc=org".to_string()]);
		let entry = into_directory_entry(SearchEntry {
			dn: "cn=jdoe,dc=org".to_string(),
			attrs,
			bin_attrs: HashMap::new(),
		});
		assert_eq!(entry.attribute("memberof").unwrap(), ["cn=A,dc=org"]);
	}

	#[tokio::test]
	async fn bind_without_admin_dn_fails_without_connecting() {
		let settings = LdapSettings::from_config(
			&DirectoryConfig {
				admin_user: None,
				..config()
			},
			Duration::from_millis(200),
		)
		.unwrap();
		let directory = LdapDirectory::new(settings);
		assert!(matches!(
			directory.bind_as_administrator().await,
			Err(DirectoryError::Bind { .. })
		));
	}

	#[tokio::test]
	async fn unreachable_server_is_a_bind_error() {
		let settings = LdapSettings::from_config(&config(), Duration::from_millis(200)).unwrap();
		let directory = LdapDirectory::new(settings);
		assert!(matches!(
			directory.bind_as_administrator().await,
			Err(DirectoryError::Bind { .. })
		));
	}
}
