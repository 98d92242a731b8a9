// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;

/// Active Directory's LDAP_MATCHING_RULE_IN_CHAIN: matches when the DN-valued
/// attribute reaches the target through any number of nested entries.
pub const MATCHING_RULE_IN_CHAIN: &str = "1.2.840.113556.1.4.1941";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
	Eq,
	Approx,
	Ge,
	Le,
}

impl CompareOp {
	fn as_str(self) -> &'static str {
		match self {
			CompareOp::Eq => "=",
			CompareOp::Approx => "~=",
			CompareOp::Ge => ">=",
			CompareOp::Le => "<=",
		}
	}
}

/// An RFC 4515 search filter. Values are held unescaped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
	And(Vec<Filter>),
	Or(Vec<Filter>),
	Not(Box<Filter>),
	Compare {
		attr: String,
		op: CompareOp,
		value: String,
	},
	Present {
		attr: String,
	},
	Substring {
		attr: String,
		initial: Option<String>,
		any: Vec<String>,
		last: Option<String>,
	},
	Extensible {
		attr: String,
		rule: String,
		value: String,
	},
}

impl Filter {
	pub fn eq(attr: impl Into<String>, value: impl Into<String>) -> Self {
		Filter::Compare {
			attr: attr.into(),
			op: CompareOp::Eq,
			value: value.into(),
		}
	}

	pub fn present(attr: impl Into<String>) -> Self {
		Filter::Present { attr: attr.into() }
	}

	/// Matches entries whose `attr` reaches `dn` transitively.
	pub fn in_chain(attr: impl Into<String>, dn: impl Into<String>) -> Self {
		Filter::Extensible {
			attr: attr.into(),
			rule: MATCHING_RULE_IN_CHAIN.to_string(),
			value: dn.into(),
		}
	}

	/// Conjunction that flattens nested `And`s and skips the wrapper for a
	/// single operand.
	pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
		let mut flat = Vec::new();
		for filter in filters {
			match filter {
				Filter::And(inner) => flat.extend(inner),
				other => flat.push(other),
			}
		}
		if flat.len() == 1 {
			return flat.remove(0);
		}
		Filter::And(flat)
	}
}

impl fmt::Display for Filter {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Filter::And(filters) => write_list(f, '&', filters),
			Filter::Or(filters) => write_list(f, '|', filters),
			Filter::Not(inner) => write!(f, "(!{inner})"),
			Filter::Compare { attr, op, value } => {
				write!(f, "({attr}{}{})", op.as_str(), escape_value(value))
			}
			Filter::Present { attr } => write!(f, "({attr}=*)"),
			Filter::Substring {
				attr,
				initial,
				any,
				last,
			} => {
				write!(f, "({attr}=")?;
				if let Some(initial) = initial {
					f.write_str(&escape_value(initial))?;
				}
				f.write_str("*")?;
				for part in any {
					write!(f, "{}*", escape_value(part))?;
				}
				if let Some(last) = last {
					f.write_str(&escape_value(last))?;
				}
				f.write_str(")")
			}
			Filter::Extensible { attr, rule, value } => {
				write!(f, "({attr}:{rule}:={})", escape_value(value))
			}
		}
	}
}

fn write_list(f: &mut fmt::Formatter<'_>, op: char, filters: &[Filter]) -> fmt::Result {
	write!(f, "({op}")?;
	for filter in filters {
		write!(f, "{filter}")?;
	}
	f.write_str(")")
}

/// Escapes an assertion value per RFC 4515 section 3.
pub fn escape_value(value: &str) -> String {
	let mut escaped = String::with_capacity(value.len());
	for c in value.chars() {
		match c {
			'*' => escaped.push_str("\\2a"),
			'(' => escaped.push_str("\\28"),
			')' => escaped.push_str("\\29"),
			'\\' => escaped.push_str("\\5c"),
			'\0' => escaped.push_str("\\00"),
			c => escaped.push(c),
		}
	}
	escaped
}
