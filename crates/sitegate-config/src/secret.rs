// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Redacting wrapper for credentials such as the directory bind password.
//!
//! `Debug`, `Display` and `Serialize` all print `[REDACTED]`, so a secret can
//! sit inside a config struct that is logged with `?config` without leaking.
//! The wrapped value is zeroized on drop. Use [`Secret::expose`] at the one
//! place the real value is needed.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::Zeroize;

use crate::error::ConfigError;

const REDACTED: &str = "[REDACTED]";

#[derive(Zeroize)]
#[zeroize(drop)]
pub struct Secret<T>
where
	T: Zeroize,
{
	inner: T,
}

pub type SecretString = Secret<String>;

impl<T> Secret<T>
where
	T: Zeroize,
{
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl<T> Clone for Secret<T>
where
	T: Zeroize + Clone,
{
	fn clone(&self) -> Self {
		Self {
			inner: self.inner.clone(),
		}
	}
}

impl<T> fmt::Debug for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_tuple("Secret").field(&REDACTED).finish()
	}
}

impl<T> fmt::Display for Secret<T>
where
	T: Zeroize,
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T> PartialEq for Secret<T>
where
	T: Zeroize + PartialEq,
{
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T> Eq for Secret<T> where T: Zeroize + Eq {}

impl<T> Serialize for Secret<T>
where
	T: Zeroize,
{
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(REDACTED)
	}
}

impl<'de, T> Deserialize<'de> for Secret<T>
where
	T: Deserialize<'de> + Zeroize,
{
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		T::deserialize(deserializer).map(Secret::new)
	}
}

/// Reads a secret using the `VAR` / `VAR_FILE` convention from a snapshot of
/// environment variables.
///
/// `VAR_FILE` wins over `VAR`. A single trailing newline in the file is
/// stripped; an empty `VAR_FILE` is an error.
pub fn load_secret_var(
	vars: &BTreeMap<String, String>,
	var: &str,
) -> Result<Option<SecretString>, ConfigError> {
	let file_var = format!("{var}_FILE");

	if let Some(path_str) = vars.get(&file_var) {
		if path_str.is_empty() {
			return Err(ConfigError::Secret(format!("secret file path in {file_var} is empty")));
		}

		let path = PathBuf::from(path_str);
		let content = std::fs::read_to_string(&path).map_err(|e| {
			ConfigError::Secret(format!("failed to read secret file at {}: {e}", path.display()))
		})?;

		let secret = content.strip_suffix('\n').unwrap_or(&content).to_string();
		return Ok(Some(Secret::new(secret)));
	}

	Ok(vars.get(var).cloned().map(Secret::new))
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;
	use tempfile::NamedTempFile;

	mod secret_type {
		use super::*;

		#[test]
		fn debug_and_display_are_redacted() {
			let secret = Secret::new("bind-password".to_string());
			assert_eq!(format!("{secret:?}"), "Secret(\"[REDACTED]\")");
			assert_eq!(format!("{secret}"), "[REDACTED]");
			assert_eq!(secret.expose(), "bind-password");
		}

		#[test]
		fn serialize_is_redacted() {
			let secret = Secret::new("bind-password".to_string());
			let json = serde_json::to_string(&secret).unwrap();
			assert_eq!(json, "\"[REDACTED]\"");
		}

		#[test]
		fn deserialize_keeps_value() {
			let secret: SecretString = serde_json::from_str("\"hunter2\"").unwrap();
			assert_eq!(secret.expose(), "hunter2");
		}
	}

	mod load_secret_var_tests {
		use super::*;

		fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
			pairs
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect()
		}

		#[test]
		fn returns_none_when_not_set() {
			assert!(load_secret_var(&vars(&[]), "PASS").unwrap().is_none());
		}

		#[test]
		fn reads_direct_value() {
			let secret = load_secret_var(&vars(&[("PASS", "direct")]), "PASS")
				.unwrap()
				.unwrap();
			assert_eq!(secret.expose(), "direct");
		}

		#[test]
		fn file_takes_precedence_and_strips_newline() {
			let mut file = NamedTempFile::new().unwrap();
			writeln!(file, "from-file").unwrap();
			let path = file.path().to_string_lossy().to_string();

			let secret = load_secret_var(
				&vars(&[("PASS", "direct"), ("PASS_FILE", path.as_str())]),
				"PASS",
			)
			.unwrap()
			.unwrap();
			assert_eq!(secret.expose(), "from-file");
		}

		#[test]
		fn empty_file_path_is_error() {
			let result = load_secret_var(&vars(&[("PASS_FILE", "")]), "PASS");
			assert!(matches!(result, Err(ConfigError::Secret(_))));
		}

		#[test]
		fn missing_file_is_error() {
			let result = load_secret_var(
				&vars(&[("PASS_FILE", "/nonexistent/sitegate/secret")]),
				"PASS",
			);
			assert!(result.is_err());
		}
	}
}
