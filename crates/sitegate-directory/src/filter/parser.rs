// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use super::ast::{CompareOp, Filter};
use winnow::combinator::{alt, preceded, repeat};
use winnow::error::ContextError;
use winnow::prelude::*;
use winnow::token::take_while;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid LDAP filter '{input}': {message}")]
pub struct FilterParseError {
	pub input: String,
	pub message: String,
}

pub struct FilterParser;

impl FilterParser {
	/// Parses an RFC 4515 filter. A bare item such as `objectClass=person` is
	/// accepted and treated as if it were parenthesized.
	pub fn parse(input: &str) -> Result<Filter, FilterParseError> {
		let trimmed = input.trim();
		let wrapped;
		let source = if trimmed.starts_with('(') {
			trimmed
		} else {
			wrapped = format!("({trimmed})");
			wrapped.as_str()
		};

		parse_filter.parse(source).map_err(|e| FilterParseError {
			input: input.to_string(),
			message: format!("{:?}", e),
		})
	}
}

fn parse_filter(input: &mut &str) -> Result<Filter, ContextError> {
	expect(input, '(')?;
	let filter = parse_component(input)?;
	expect(input, ')')?;
	Ok(filter)
}

fn parse_component(input: &mut &str) -> Result<Filter, ContextError> {
	alt((
		preceded('&', parse_list).map(Filter::And),
		preceded('|', parse_list).map(Filter::Or),
		preceded('!', parse_filter).map(|inner| Filter::Not(Box::new(inner))),
		parse_item,
	))
	.parse_next(input)
}

fn parse_list(input: &mut &str) -> Result<Vec<Filter>, ContextError> {
	repeat(1.., parse_filter).parse_next(input)
}

fn parse_item(input: &mut &str) -> Result<Filter, ContextError> {
	let attr = parse_attr(input)?;
	let op = parse_operator(input)?;

	match op {
		":" => {
			let rule = parse_rule(input)?;
			expect(input, ':')?;
			expect(input, '=')?;
			let value = parse_value(input)?;
			Ok(Filter::Extensible { attr, rule, value })
		}
		"~=" => Ok(Filter::Compare {
			attr,
			op: CompareOp::Approx,
			value: parse_value(input)?,
		}),
		">=" => Ok(Filter::Compare {
			attr,
			op: CompareOp::Ge,
			value: parse_value(input)?,
		}),
		"<=" => Ok(Filter::Compare {
			attr,
			op: CompareOp::Le,
			value: parse_value(input)?,
		}),
		_ => parse_equality_or_substring(attr, input),
	}
}

/// After `attr=`: `*` alone is a presence test, unescaped `*` elsewhere splits
/// a substring assertion, anything else is plain equality.
fn parse_equality_or_substring(attr: String, input: &mut &str) -> Result<Filter, ContextError> {
	let raw = parse_raw_value(input)?;

	if raw == "*" {
		return Ok(Filter::Present { attr });
	}

	let parts: Vec<&str> = raw.split('*').collect();
	if parts.len() == 1 {
		return Ok(Filter::Compare {
			attr,
			op: CompareOp::Eq,
			value: unescape(raw)?,
		});
	}

	let non_empty = |part: &&str| !part.is_empty();
	let initial = Some(parts[0]).filter(non_empty).map(unescape).transpose()?;
	let last = parts
		.last()
		.copied()
		.filter(non_empty)
		.map(unescape)
		.transpose()?;
	let any = parts[1..parts.len() - 1]
		.iter()
		.copied()
		.filter(non_empty)
		.map(unescape)
		.collect::<Result<Vec<_>, _>>()?;

	Ok(Filter::Substring {
		attr,
		initial,
		any,
		last,
	})
}

fn expect(input: &mut &str, mut c: char) -> Result<char, ContextError> {
	c.parse_next(input)
}

fn parse_attr(input: &mut &str) -> Result<String, ContextError> {
	take_while(1.., |c: char| {
		c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == ';'
	})
	.map(|s: &str| s.to_string())
	.parse_next(input)
}

fn parse_rule(input: &mut &str) -> Result<String, ContextError> {
	take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '.')
		.map(|s: &str| s.to_string())
		.parse_next(input)
}

fn parse_operator<'s>(input: &mut &'s str) -> Result<&'s str, ContextError> {
	alt((":", "~=", ">=", "<=", "=")).parse_next(input)
}

fn parse_raw_value<'s>(input: &mut &'s str) -> Result<&'s str, ContextError> {
	take_while(0.., |c: char| c != '(' && c != ')').parse_next(input)
}

fn parse_value(input: &mut &str) -> Result<String, ContextError> {
	let raw = parse_raw_value(input)?;
	unescape(raw)
}

/// Decodes `\hh` escapes. A backslash not followed by two hex digits is an error.
fn unescape(raw: &str) -> Result<String, ContextError> {
	let bytes = raw.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'\\' {
			let byte = bytes
				.get(i + 1..i + 3)
				.filter(|pair| pair.iter().all(u8::is_ascii_hexdigit))
				.and_then(|pair| std::str::from_utf8(pair).ok())
				.and_then(|pair| u8::from_str_radix(pair, 16).ok())
				.ok_or_else(ContextError::new)?;
			out.push(byte);
			i += 3;
		} else {
			out.push(bytes[i]);
			i += 1;
		}
	}
	String::from_utf8(out).map_err(|_| ContextError::new())
}
