// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The outcome of a resolution run.

use std::collections::BTreeSet;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::site::SiteId;

/// Final access for a directory user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessResult {
	/// Global superuser; excludes any per-site grant.
	Superuser,
	/// Per-site admin and view grants (either may be empty).
	Sites(SiteGrants),
}

impl AccessResult {
	pub fn is_superuser(&self) -> bool {
		matches!(self, AccessResult::Superuser)
	}

	pub fn site_grants(&self) -> Option<&SiteGrants> {
		match self {
			AccessResult::Superuser => None,
			AccessResult::Sites(grants) => Some(grants),
		}
	}

	/// True when the user receives no access at all.
	pub fn is_empty(&self) -> bool {
		match self {
			AccessResult::Superuser => false,
			AccessResult::Sites(grants) => grants.is_empty(),
		}
	}
}

impl Default for AccessResult {
	fn default() -> Self {
		AccessResult::Sites(SiteGrants::default())
	}
}

impl Serialize for AccessResult {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		match self {
			AccessResult::Superuser => {
				let mut map = serializer.serialize_map(Some(1))?;
				map.serialize_entry("superuser", &true)?;
				map.end()
			}
			AccessResult::Sites(grants) => grants.serialize(serializer),
		}
	}
}

/// Accumulated per-site grants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SiteGrants {
	admin: BTreeSet<SiteId>,
	view: BTreeSet<SiteId>,
}

impl SiteGrants {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an admin grant. Idempotent.
	pub fn grant_admin(&mut self, site_id: SiteId) {
		self.admin.insert(site_id);
	}

	/// Adds a view grant unless the site already holds an admin grant.
	///
	/// The check is against the admin grants present now; an admin grant added
	/// later does not remove an earlier view grant. Returns whether the view
	/// grant was recorded.
	pub fn grant_view(&mut self, site_id: SiteId) -> bool {
		if self.admin.contains(&site_id) {
			return false;
		}
		self.view.insert(site_id);
		true
	}

	pub fn admin(&self) -> &BTreeSet<SiteId> {
		&self.admin
	}

	pub fn view(&self) -> &BTreeSet<SiteId> {
		&self.view
	}

	pub fn is_empty(&self) -> bool {
		self.admin.is_empty() && self.view.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn site(id: u32) -> SiteId {
		SiteId::new(id)
	}

	#[test]
	fn admin_grants_are_idempotent() {
		let mut grants = SiteGrants::new();
		grants.grant_admin(site(1));
		grants.grant_admin(site(1));
		assert_eq!(grants.admin().len(), 1);
	}

	#[test]
	fn view_is_suppressed_by_existing_admin() {
		let mut grants = SiteGrants::new();
		grants.grant_admin(site(3));
		assert!(!grants.grant_view(site(3)));
		assert!(grants.view().is_empty());
	}

	#[test]
	fn later_admin_does_not_retract_view() {
		let mut grants = SiteGrants::new();
		assert!(grants.grant_view(site(3)));
		grants.grant_admin(site(3));
		assert!(grants.admin().contains(&site(3)));
		assert!(grants.view().contains(&site(3)));
	}

	#[test]
	fn default_result_is_empty() {
		let result = AccessResult::default();
		assert!(result.is_empty());
		assert!(!result.is_superuser());
		assert!(!AccessResult::Superuser.is_empty());
	}

	mod serde_format {
		use super::*;

		#[test]
		fn superuser_serializes_as_flag() {
			let json = serde_json::to_value(AccessResult::Superuser).unwrap();
			assert_eq!(json, serde_json::json!({"superuser": true}));
		}

		#[test]
		fn site_grants_serialize_sorted() {
			let mut grants = SiteGrants::new();
			grants.grant_admin(site(5));
			grants.grant_admin(site(2));
			grants.grant_view(site(9));
			let json = serde_json::to_value(AccessResult::Sites(grants)).unwrap();
			assert_eq!(json, serde_json::json!({"admin": [2, 5], "view": [9]}));
		}
	}
}
