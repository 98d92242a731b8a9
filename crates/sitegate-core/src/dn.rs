// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Distinguished-name helpers.

/// Lower-cases a DN for case-insensitive comparison.
pub fn normalize(dn: &str) -> String {
	dn.to_lowercase()
}

/// Case-insensitive DN equality.
pub fn eq(a: &str, b: &str) -> bool {
	a == b || normalize(a) == normalize(b)
}

/// Extracts the common name from the first RDN of `dn`.
///
/// Returns `None` if the first RDN is not a `cn` attribute or its value is
/// empty or badly escaped. Escapes (`\,` and `\2C` style) are decoded.
pub fn common_name(dn: &str) -> Option<String> {
	let (attr_type, raw_value) = first_rdn(dn)?;
	if !attr_type.trim().eq_ignore_ascii_case("cn") {
		return None;
	}
	let value = unescape(raw_value.trim())?;
	if value.is_empty() {
		return None;
	}
	Some(value)
}

/// Splits the first attribute-value assertion off `dn`: everything up to the
/// first unescaped `,` or `+`, divided at the first `=`.
fn first_rdn(dn: &str) -> Option<(&str, &str)> {
	let mut escaped = false;
	let mut end = dn.len();
	for (idx, c) in dn.char_indices() {
		if escaped {
			escaped = false;
			continue;
		}
		match c {
			'\\' => escaped = true,
			',' | '+' => {
				end = idx;
				break;
			}
			_ => {}
		}
	}
	dn[..end].split_once('=')
}

fn unescape(value: &str) -> Option<String> {
	let bytes = value.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] != b'\\' {
			out.push(bytes[i]);
			i += 1;
			continue;
		}
		let next = *bytes.get(i + 1)?;
		let hex = bytes
			.get(i + 1..i + 3)
			.filter(|pair| pair.iter().all(u8::is_ascii_hexdigit))
			.and_then(|pair| std::str::from_utf8(pair).ok())
			.and_then(|pair| u8::from_str_radix(pair, 16).ok());
		match hex {
			Some(byte) => {
				out.push(byte);
				i += 3;
			}
			None => {
				out.push(next);
				i += 2;
			}
		}
	}
	String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	mod common_name {
		use super::*;

		#[test]
		fn extracts_first_rdn_value() {
			assert_eq!(
				common_name("cn=Jane Doe,ou=Users,dc=organization,dc=com").as_deref(),
				Some("Jane Doe")
			);
		}

		#[test]
		fn attribute_type_is_case_insensitive() {
			assert_eq!(common_name("CN=jdoe,dc=org").as_deref(), Some("jdoe"));
			assert_eq!(common_name(" Cn = jdoe ,dc=org").as_deref(), Some("jdoe"));
		}

		#[test]
		fn single_rdn_dn() {
			assert_eq!(common_name("cn=jdoe").as_deref(), Some("jdoe"));
		}

		#[test]
		fn decodes_escaped_comma() {
			assert_eq!(
				common_name(r"cn=Doe\, John,ou=Users,dc=org").as_deref(),
				Some("Doe, John")
			);
			assert_eq!(
				common_name(r"cn=Doe\2C John,ou=Users,dc=org").as_deref(),
				Some("Doe, John")
			);
		}

		#[test]
		fn decodes_utf8_hex_escapes() {
			assert_eq!(common_name(r"cn=J\C3\BCrgen,dc=org").as_deref(), Some("Jürgen"));
		}

		#[test]
		fn stops_at_multivalued_rdn() {
			assert_eq!(common_name("cn=jdoe+uid=42,dc=org").as_deref(), Some("jdoe"));
		}

		#[test]
		fn rejects_other_attribute_types() {
			assert_eq!(common_name("uid=jdoe,ou=People,dc=org"), None);
			assert_eq!(common_name("cnx=jdoe,dc=org"), None);
		}

		#[test]
		fn rejects_malformed() {
			assert_eq!(common_name(""), None);
			assert_eq!(common_name("cn=,dc=org"), None);
			assert_eq!(common_name("jdoe"), None);
			assert_eq!(common_name(r"cn=trailing\"), None);
		}
	}

	#[test]
	fn equality_ignores_case() {
		assert!(eq("CN=John,DC=Org", "cn=john,dc=org"));
		assert!(!eq("cn=john,dc=org", "cn=jane,dc=org"));
	}

	proptest! {
		#[test]
		fn plain_names_roundtrip(name in "[A-Za-z0-9][A-Za-z0-9 ._-]{0,30}[A-Za-z0-9]") {
			let dn = format!("cn={name},ou=Users,dc=example,dc=com");
			prop_assert_eq!(common_name(&dn), Some(name));
		}

		#[test]
		fn eq_is_case_insensitive(dn in "[a-z]{1,4}=[A-Za-z]{1,10}(,[a-z]{2}=[A-Za-z]{1,8}){0,3}") {
			prop_assert!(eq(&dn.to_uppercase(), &dn));
		}
	}
}
