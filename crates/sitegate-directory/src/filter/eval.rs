// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use super::ast::{CompareOp, Filter, MATCHING_RULE_IN_CHAIN};
use crate::entry::DirectoryEntry;

/// Something a filter can be evaluated against.
pub trait FilterTarget {
	/// Values of `attr`, empty if absent. Lookup is case-insensitive.
	fn values(&self, attr: &str) -> &[String];

	/// Whether `attr` reaches `dn`, following DN-valued links through other
	/// entries. The default only looks at the target's own values.
	fn in_chain(&self, attr: &str, dn: &str) -> bool {
		self.values(attr).iter().any(|v| v.eq_ignore_ascii_case(dn))
	}
}

impl FilterTarget for DirectoryEntry {
	fn values(&self, attr: &str) -> &[String] {
		self.attribute(attr).unwrap_or(&[])
	}
}

/// Evaluates `filter` with case-insensitive string matching. Unknown
/// extensible rules never match.
pub fn evaluate_filter<T: FilterTarget + ?Sized>(filter: &Filter, target: &T) -> bool {
	match filter {
		Filter::And(filters) => filters.iter().all(|f| evaluate_filter(f, target)),
		Filter::Or(filters) => filters.iter().any(|f| evaluate_filter(f, target)),
		Filter::Not(inner) => !evaluate_filter(inner, target),
		Filter::Present { attr } => !target.values(attr).is_empty(),
		Filter::Compare { attr, op, value } => {
			let value = value.to_lowercase();
			target.values(attr).iter().any(|candidate| {
				let candidate = candidate.to_lowercase();
				match op {
					CompareOp::Eq | CompareOp::Approx => candidate == value,
					CompareOp::Ge => candidate >= value,
					CompareOp::Le => candidate <= value,
				}
			})
		}
		Filter::Substring {
			attr,
			initial,
			any,
			last,
		} => target
			.values(attr)
			.iter()
			.any(|candidate| substring_matches(&candidate.to_lowercase(), initial, any, last)),
		Filter::Extensible { attr, rule, value } => {
			rule == MATCHING_RULE_IN_CHAIN && target.in_chain(attr, value)
		}
	}
}

fn substring_matches(
	candidate: &str,
	initial: &Option<String>,
	any: &[String],
	last: &Option<String>,
) -> bool {
	let mut rest = candidate;

	if let Some(initial) = initial {
		match rest.strip_prefix(initial.to_lowercase().as_str()) {
			Some(after) => rest = after,
			None => return false,
		}
	}

	for part in any {
		let part = part.to_lowercase();
		match rest.find(part.as_str()) {
			Some(pos) => rest = &rest[pos + part.len()..],
			None => return false,
		}
	}

	match last {
		Some(last) => rest.ends_with(last.to_lowercase().as_str()),
		None => true,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::filter::FilterParser;

	fn person() -> DirectoryEntry {
		DirectoryEntry::new("cn=John Doe,ou=Users,dc=org")
			.with_attribute("objectCategory", "Person")
			.with_attribute("cn", "John Doe")
			.with_attribute("memberOf", vec!["CN=Staff,dc=org"])
			.with_attribute("uidNumber", "1500")
	}

	fn matches(filter: &str) -> bool {
		evaluate_filter(&FilterParser::parse(filter).unwrap(), &person())
	}

	#[test]
	fn equality_is_case_insensitive() {
		assert!(matches("(objectcategory=person)"));
		assert!(matches("(CN=john doe)"));
		assert!(!matches("(cn=jane doe)"));
	}

	#[test]
	fn boolean_operators() {
		assert!(matches("(&(cn=John Doe)(objectCategory=Person))"));
		assert!(matches("(|(cn=nobody)(objectCategory=Person))"));
		assert!(matches("(!(cn=nobody))"));
		assert!(!matches("(&(cn=John Doe)(cn=nobody))"));
	}

	#[test]
	fn presence_and_substring() {
		assert!(matches("(memberOf=*)"));
		assert!(!matches("(mail=*)"));
		assert!(matches("(cn=jo*doe)"));
		assert!(matches("(cn=*n D*)"));
		assert!(!matches("(cn=doe*)"));
	}

	#[test]
	fn ordering_compares_strings() {
		assert!(matches("(uidNumber>=1000)"));
		assert!(matches("(uidNumber<=2000)"));
		assert!(!matches("(uidNumber>=2000)"));
	}

	#[test]
	fn in_chain_defaults_to_direct_values() {
		assert!(matches("(memberOf:1.2.840.113556.1.4.1941:=cn=staff,dc=org)"));
		assert!(!matches("(memberOf:1.2.840.113556.1.4.1941:=cn=other,dc=org)"));
	}

	#[test]
	fn unknown_extensible_rule_never_matches() {
		assert!(!matches("(memberOf:1.2.3.4:=cn=staff,dc=org)"));
	}
}
