// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration management for sitegate.
//!
//! This crate provides:
//! - Layered configuration from multiple sources (defaults, TOML file, environment)
//! - The `[login_ldap]` key/value section and the entitlement loader built on it
//! - Directory server settings with a redacted bind password
//!
//! # Usage
//!
//! ```ignore
//! use sitegate_config::load_config;
//!
//! let config = load_config()?;
//! let directives = config.login_ldap.entitlements().directives();
//! ```

pub mod entitlements;
pub mod error;
pub mod layer;
pub mod secret;
pub mod sections;
pub mod sources;

pub use entitlements::{
	EntitlementConfiguration, EntitlementKey, EntitlementKeyError, EntitlementSlot, SUPERUSER_DN_KEY,
};
pub use error::ConfigError;
pub use layer::SitegateConfigLayer;
pub use secret::{Secret, SecretString};
pub use sections::*;
pub use sources::{ConfigSource, DefaultsSource, EnvSource, Precedence, TomlSource, DEFAULT_CONFIG_PATH};

use tracing::{debug, info};

/// Fully resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct SitegateConfig {
	pub login_ldap: LoginLdapConfig,
	/// `None` when no directory server is configured.
	pub directory: Option<DirectoryConfig>,
	pub logging: LoggingConfig,
}

/// Load configuration from all sources with standard precedence.
///
/// Precedence (highest to lowest):
/// 1. Environment variables (`SITEGATE_*`)
/// 2. Config file (`/etc/sitegate/sitegate.toml`)
/// 3. Built-in defaults
pub fn load_config() -> Result<SitegateConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::system()),
		Box::new(EnvSource::new()),
	])
}

/// Load configuration with a custom config file path.
pub fn load_config_with_file(
	config_path: impl Into<std::path::PathBuf>,
) -> Result<SitegateConfig, ConfigError> {
	load_from_sources(vec![
		Box::new(DefaultsSource),
		Box::new(TomlSource::new(config_path)),
		Box::new(EnvSource::new()),
	])
}

/// Merge the given sources in precedence order and finalize.
pub fn load_from_sources(
	mut sources: Vec<Box<dyn ConfigSource>>,
) -> Result<SitegateConfig, ConfigError> {
	sources.sort_by_key(|s| s.precedence());

	let mut merged = SitegateConfigLayer::default();
	for source in sources {
		debug!(source = source.name(), "loading configuration source");
		let layer = source.load()?;
		merged.merge(layer);
	}

	finalize(merged)
}

/// Finalize configuration layer into resolved config.
fn finalize(layer: SitegateConfigLayer) -> Result<SitegateConfig, ConfigError> {
	let login_ldap = layer.login_ldap.unwrap_or_default().finalize()?;
	let directory = layer.directory.unwrap_or_default().finalize()?;
	let logging = layer.logging.unwrap_or_default().finalize();

	let entitlements = login_ldap.entitlements();

	info!(
		member_of_field = %login_ldap.required_member_of_field,
		network_timeout_secs = login_ldap.network_timeout.as_secs(),
		superuser_configured = entitlements.superuser_group_dn.is_some(),
		site_entitlements = entitlements.site_entitlements.len(),
		directory_configured = directory.is_some(),
		"Sitegate configuration loaded"
	);

	Ok(SitegateConfig {
		login_ldap,
		directory,
		logging,
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use std::time::Duration;
	use tempfile::NamedTempFile;

	fn write_config(content: &str) -> NamedTempFile {
		let mut file = NamedTempFile::new().unwrap();
		file.write_all(content.as_bytes()).unwrap();
		file
	}

	fn load(file: &NamedTempFile, env: &[(&str, &str)]) -> Result<SitegateConfig, ConfigError> {
		load_from_sources(vec![
			Box::new(EnvSource::from_vars(env.iter().copied())),
			Box::new(TomlSource::new(file.path())),
			Box::new(DefaultsSource),
		])
	}

	#[test]
	fn test_defaults_only() {
		let config = load_from_sources(vec![Box::new(DefaultsSource)]).unwrap();
		assert_eq!(config.login_ldap.required_member_of_field, "memberOf");
		assert_eq!(config.login_ldap.network_timeout, Duration::from_secs(15));
		assert!(config.directory.is_none());
		assert_eq!(config.logging.level, "info");
	}

	#[test]
	fn test_environment_overrides_file() {
		let file = write_config(
			r#"
[login_ldap]
ldap_network_timeout = 30
entitlements_site_1_admin_dn = "cn=FromFile,dc=org"

[logging]
level = "warn"
"#,
		);
		let config = load(
			&file,
			&[
				("SITEGATE_LOGIN_LDAP_ENTITLEMENTS_SITE_1_ADMIN_DN", "cn=FromEnv,dc=org"),
				("SITEGATE_LOG_LEVEL", "debug"),
			],
		)
		.unwrap();

		assert_eq!(config.login_ldap.network_timeout, Duration::from_secs(30));
		assert_eq!(
			config.login_ldap.get("entitlements_site_1_admin_dn"),
			Some("cn=FromEnv,dc=org")
		);
		assert_eq!(config.logging.level, "debug");
	}

	#[test]
	fn test_file_entitlements_become_directives() {
		let file = write_config(
			r#"
[login_ldap]
entitlements_superuser_dn = "cn=SU,dc=org,dc=com"
entitlements_site_5_view_dn = "cn=Viewers,dc=org,dc=com"
entitlements_site_5_admin_dn = "cn=Admins,dc=org,dc=com"
entitlements_site_abc_admin_dn = "cn=Ignored,dc=org,dc=com"
"#,
		);
		let config = load(&file, &[]).unwrap();
		let directives = config.login_ldap.entitlements().directives();
		let dns: Vec<&str> = directives.iter().map(|d| d.group_dn()).collect();
		assert_eq!(
			dns,
			["cn=SU,dc=org,dc=com", "cn=Admins,dc=org,dc=com", "cn=Viewers,dc=org,dc=com"]
		);
	}

	#[test]
	fn test_directory_requires_base_dn() {
		let file = write_config("[directory]\nurl = \"ldap://dc1\"\n");
		let result = load(&file, &[]);
		assert!(matches!(result, Err(ConfigError::Validation(_))));
	}

	#[test]
	fn test_directory_password_from_file() {
		let mut secret = NamedTempFile::new().unwrap();
		writeln!(secret, "from-secret-file").unwrap();
		let secret_path = secret.path().to_string_lossy().to_string();

		let file = write_config("[directory]\nurl = \"ldap://dc1\"\nbase_dn = \"dc=org\"\n");
		let config = load(
			&file,
			&[("SITEGATE_DIRECTORY_ADMIN_PASS_FILE", secret_path.as_str())],
		)
		.unwrap();
		let directory = config.directory.unwrap();
		assert_eq!(directory.admin_pass.unwrap().expose(), "from-secret-file");
	}
}
