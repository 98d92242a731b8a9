// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources: defaults, TOML files and environment variables.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::layer::SitegateConfigLayer;
use crate::secret::load_secret_var;
use crate::sections::{DirectoryConfigLayer, LoggingConfigLayer, LoginLdapConfigLayer};

pub const DEFAULT_CONFIG_PATH: &str = "/etc/sitegate/sitegate.toml";

const ENV_PREFIX: &str = "SITEGATE_";
const LOGIN_LDAP_ENV_PREFIX: &str = "SITEGATE_LOGIN_LDAP_";

/// Source precedence levels (higher = overrides lower).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults = 10,
	ConfigFile = 20,
	Environment = 50,
}

/// Trait for configuration sources.
pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &'static str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<SitegateConfigLayer, ConfigError>;
}

/// Built-in defaults source.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &'static str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<SitegateConfigLayer, ConfigError> {
		debug!("loading defaults");
		Ok(SitegateConfigLayer::default())
	}
}

/// TOML file configuration source. A missing file yields an empty layer.
pub struct TomlSource {
	path: PathBuf,
}

impl TomlSource {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn system() -> Self {
		Self::new(DEFAULT_CONFIG_PATH)
	}
}

impl ConfigSource for TomlSource {
	fn name(&self) -> &'static str {
		"toml-config"
	}

	fn precedence(&self) -> Precedence {
		Precedence::ConfigFile
	}

	fn load(&self) -> Result<SitegateConfigLayer, ConfigError> {
		if !self.path.exists() {
			debug!(path = %self.path.display(), "config file not found, skipping");
			return Ok(SitegateConfigLayer::default());
		}

		debug!(path = %self.path.display(), "loading config file");
		let content = std::fs::read_to_string(&self.path).map_err(|e| ConfigError::FileRead {
			path: self.path.clone(),
			source: e,
		})?;

		let layer: SitegateConfigLayer =
			toml::from_str(&content).map_err(|e| ConfigError::TomlParse {
				path: self.path.clone(),
				source: e,
			})?;

		trace!("parsed config layer from TOML");
		Ok(layer)
	}
}

/// Environment variable source.
///
/// Convention: `SITEGATE_<SECTION>_<FIELD>`. Every `SITEGATE_LOGIN_LDAP_<KEY>`
/// variable sets the lower-cased `<KEY>` in `[login_ldap]`; keys are applied in
/// sorted order.
pub struct EnvSource {
	vars: Option<BTreeMap<String, String>>,
}

impl EnvSource {
	/// Reads the process environment.
	pub fn new() -> Self {
		Self { vars: None }
	}

	/// Reads a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(
				vars
					.into_iter()
					.map(|(k, v)| (k.into(), v.into()))
					.collect(),
			),
		}
	}

	fn snapshot(&self) -> BTreeMap<String, String> {
		match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars()
				.filter(|(k, _)| k.starts_with(ENV_PREFIX))
				.collect(),
		}
	}
}

impl Default for EnvSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &'static str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<SitegateConfigLayer, ConfigError> {
		debug!("loading environment variables");
		let vars = self.snapshot();
		Ok(SitegateConfigLayer {
			login_ldap: Some(load_login_ldap_from_env(&vars)),
			directory: Some(load_directory_from_env(&vars)?),
			logging: Some(load_logging_from_env(&vars)),
		})
	}
}

fn env_var(vars: &BTreeMap<String, String>, name: &str) -> Option<String> {
	vars.get(name).filter(|s| !s.is_empty()).cloned()
}

fn env_bool(vars: &BTreeMap<String, String>, name: &str) -> Result<Option<bool>, ConfigError> {
	match env_var(vars, name) {
		Some(v) if v.eq_ignore_ascii_case("true") || v == "1" => Ok(Some(true)),
		Some(v) if v.eq_ignore_ascii_case("false") || v == "0" => Ok(Some(false)),
		Some(v) => Err(ConfigError::InvalidValue {
			key: name.to_string(),
			message: format!("invalid boolean value '{v}'"),
		}),
		None => Ok(None),
	}
}

fn load_login_ldap_from_env(vars: &BTreeMap<String, String>) -> LoginLdapConfigLayer {
	let mut layer = LoginLdapConfigLayer::default();
	for (name, value) in vars {
		if let Some(key) = name.strip_prefix(LOGIN_LDAP_ENV_PREFIX) {
			if !key.is_empty() {
				layer.set(key.to_lowercase(), value.clone());
			}
		}
	}
	layer
}

fn load_directory_from_env(
	vars: &BTreeMap<String, String>,
) -> Result<DirectoryConfigLayer, ConfigError> {
	Ok(DirectoryConfigLayer {
		url: env_var(vars, "SITEGATE_DIRECTORY_URL"),
		base_dn: env_var(vars, "SITEGATE_DIRECTORY_BASE_DN"),
		admin_user: env_var(vars, "SITEGATE_DIRECTORY_ADMIN_USER"),
		admin_pass: load_secret_var(vars, "SITEGATE_DIRECTORY_ADMIN_PASS")?,
		start_tls: env_bool(vars, "SITEGATE_DIRECTORY_START_TLS")?,
		user_id_field: env_var(vars, "SITEGATE_DIRECTORY_USER_ID_FIELD"),
		user_filter: env_var(vars, "SITEGATE_DIRECTORY_USER_FILTER"),
	})
}

fn load_logging_from_env(vars: &BTreeMap<String, String>) -> LoggingConfigLayer {
	LoggingConfigLayer {
		level: env_var(vars, "SITEGATE_LOG_LEVEL"),
	}
}
