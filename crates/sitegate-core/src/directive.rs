// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Group permission directives and their evaluation order.
//!
//! A [`DirectiveSet`] is the immutable, ordered rule list consumed by the
//! access aggregator. Its order is part of its meaning:
//!
//! 1. the superuser directive (if configured),
//! 2. every admin directive, in configuration order,
//! 3. every view directive, in configuration order.
//!
//! Superuser first lets the aggregator stop at the first superuser match.
//! Admin before view is what keeps a site from appearing in both the admin and
//! view grants of a result, because view grants are only checked against the
//! admin grants collected so far.

use std::fmt;

use serde::Serialize;

use crate::site::SiteId;

/// Access level a directive can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
	Superuser,
	Admin,
	View,
}

impl fmt::Display for AccessLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			AccessLevel::Superuser => write!(f, "superuser"),
			AccessLevel::Admin => write!(f, "admin"),
			AccessLevel::View => write!(f, "view"),
		}
	}
}

/// Access level that applies to a single site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteAccessLevel {
	Admin,
	View,
}

impl SiteAccessLevel {
	pub fn all() -> &'static [SiteAccessLevel] {
		&[SiteAccessLevel::Admin, SiteAccessLevel::View]
	}
}

impl fmt::Display for SiteAccessLevel {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		AccessLevel::from(*self).fmt(f)
	}
}

impl From<SiteAccessLevel> for AccessLevel {
	fn from(level: SiteAccessLevel) -> Self {
		match level {
			SiteAccessLevel::Admin => AccessLevel::Admin,
			SiteAccessLevel::View => AccessLevel::View,
		}
	}
}

/// What a directive grants when its group matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "access_level", content = "site_id", rename_all = "snake_case")]
pub enum Grant {
	Superuser,
	Admin(SiteId),
	View(SiteId),
}

impl Grant {
	pub fn site(level: SiteAccessLevel, site_id: SiteId) -> Self {
		match level {
			SiteAccessLevel::Admin => Grant::Admin(site_id),
			SiteAccessLevel::View => Grant::View(site_id),
		}
	}

	pub fn access_level(&self) -> AccessLevel {
		match self {
			Grant::Superuser => AccessLevel::Superuser,
			Grant::Admin(_) => AccessLevel::Admin,
			Grant::View(_) => AccessLevel::View,
		}
	}

	pub fn site_id(&self) -> Option<SiteId> {
		match self {
			Grant::Superuser => None,
			Grant::Admin(site_id) | Grant::View(site_id) => Some(*site_id),
		}
	}
}

/// A directory group paired with the access its members receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupPermissionDirective {
	group_dn: String,
	#[serde(flatten)]
	grant: Grant,
}

impl GroupPermissionDirective {
	/// Returns `None` when `group_dn` is empty or whitespace.
	pub fn new(group_dn: impl Into<String>, grant: Grant) -> Option<Self> {
		let group_dn = group_dn.into();
		if group_dn.trim().is_empty() {
			return None;
		}
		Some(Self { group_dn, grant })
	}

	pub fn group_dn(&self) -> &str {
		&self.group_dn
	}

	pub fn grant(&self) -> Grant {
		self.grant
	}

	pub fn access_level(&self) -> AccessLevel {
		self.grant.access_level()
	}

	pub fn site_id(&self) -> Option<SiteId> {
		self.grant.site_id()
	}
}

/// One configured `(site, level, group)` entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SiteEntitlement {
	pub site_id: SiteId,
	pub level: SiteAccessLevel,
	pub group_dn: String,
}

impl SiteEntitlement {
	pub fn new(site_id: SiteId, level: SiteAccessLevel, group_dn: impl Into<String>) -> Self {
		Self {
			site_id,
			level,
			group_dn: group_dn.into(),
		}
	}
}

/// Ordered, immutable list of directives for one resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DirectiveSet {
	directives: Vec<GroupPermissionDirective>,
}

impl DirectiveSet {
	/// Builds the directive list in evaluation order. Entries with an empty
	/// group DN are dropped.
	pub fn new<'a, I>(superuser_dn: Option<&str>, entitlements: I) -> Self
	where
		I: IntoIterator<Item = &'a SiteEntitlement>,
	{
		let entitlements: Vec<&SiteEntitlement> = entitlements.into_iter().collect();
		let mut directives = Vec::with_capacity(entitlements.len() + 1);

		if let Some(directive) =
			superuser_dn.and_then(|dn| GroupPermissionDirective::new(dn, Grant::Superuser))
		{
			directives.push(directive);
		}

		for level in SiteAccessLevel::all() {
			directives.extend(
				entitlements
					.iter()
					.filter(|e| e.level == *level)
					.filter_map(|e| {
						GroupPermissionDirective::new(e.group_dn.clone(), Grant::site(e.level, e.site_id))
					}),
			);
		}

		Self { directives }
	}

	/// Keeps `directives` in the given order. Evaluation relies on admin
	/// directives preceding view directives for the same site; this
	/// constructor does not enforce that.
	pub fn from_ordered(directives: impl IntoIterator<Item = GroupPermissionDirective>) -> Self {
		Self {
			directives: directives.into_iter().collect(),
		}
	}

	pub fn as_slice(&self) -> &[GroupPermissionDirective] {
		&self.directives
	}

	pub fn iter(&self) -> std::slice::Iter<'_, GroupPermissionDirective> {
		self.directives.iter()
	}

	pub fn len(&self) -> usize {
		self.directives.len()
	}

	pub fn is_empty(&self) -> bool {
		self.directives.is_empty()
	}
}

impl<'a> IntoIterator for &'a DirectiveSet {
	type Item = &'a GroupPermissionDirective;
	type IntoIter = std::slice::Iter<'a, GroupPermissionDirective>;

	fn into_iter(self) -> Self::IntoIter {
		self.directives.iter()
	}
}
