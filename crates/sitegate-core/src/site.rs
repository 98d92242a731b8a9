// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identifier of a site in the analytics application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SiteId(u32);

impl SiteId {
	pub const fn new(id: u32) -> Self {
		Self(id)
	}

	pub const fn get(self) -> u32 {
		self.0
	}
}

impl fmt::Display for SiteId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl From<u32> for SiteId {
	fn from(id: u32) -> Self {
		Self(id)
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseSiteIdError {
	#[error("site id is empty")]
	Empty,

	#[error("site id '{0}' is not a decimal number")]
	NotNumeric(String),

	#[error("site id '{0}' is out of range")]
	OutOfRange(String),
}

impl FromStr for SiteId {
	type Err = ParseSiteIdError;

	/// Accepts plain decimal digits only; signs, whitespace and exponents are rejected.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		if s.is_empty() {
			return Err(ParseSiteIdError::Empty);
		}
		if !s.bytes().all(|b| b.is_ascii_digit()) {
			return Err(ParseSiteIdError::NotNumeric(s.to_string()));
		}
		s.parse::<u32>()
			.map(SiteId)
			.map_err(|_| ParseSiteIdError::OutOfRange(s.to_string()))
	}
}
