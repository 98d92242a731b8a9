// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Entitlement keys and the loader that turns `[login_ldap]` into directives.
//!
//! Keys look like `entitlements_site_<siteId>_admin_dn` or
//! `entitlements_site_<siteId>_view_dn`; the superuser group lives under
//! `entitlements_superuser_dn`. Keys that start with the entitlement prefix
//! but do not parse are logged and skipped, never reported as errors, and
//! blank values mean "slot left empty".

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use sitegate_core::{DirectiveSet, ParseSiteIdError, SiteAccessLevel, SiteEntitlement, SiteId};
use tracing::debug;

pub const SUPERUSER_DN_KEY: &str = "entitlements_superuser_dn";

const SITE_KEY_PREFIX: &str = "entitlements_site_";
const ADMIN_KEY_SUFFIX: &str = "_admin_dn";
const VIEW_KEY_SUFFIX: &str = "_view_dn";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EntitlementKeyError {
	#[error("'{0}' is not a site entitlement key")]
	NotEntitlementKey(String),

	#[error("entitlement key '{0}' has no _admin_dn or _view_dn suffix")]
	UnknownLevel(String),

	#[error("entitlement key '{key}' has an invalid site id: {source}")]
	InvalidSiteId {
		key: String,
		#[source]
		source: ParseSiteIdError,
	},
}

/// A parsed `entitlements_site_<id>_<level>_dn` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EntitlementKey {
	pub site_id: SiteId,
	pub level: SiteAccessLevel,
}

impl EntitlementKey {
	pub fn new(site_id: SiteId, level: SiteAccessLevel) -> Self {
		Self { site_id, level }
	}
}

impl FromStr for EntitlementKey {
	type Err = EntitlementKeyError;

	fn from_str(key: &str) -> Result<Self, Self::Err> {
		let rest = key
			.strip_prefix(SITE_KEY_PREFIX)
			.ok_or_else(|| EntitlementKeyError::NotEntitlementKey(key.to_string()))?;

		let (site, level) = if let Some(site) = rest.strip_suffix(ADMIN_KEY_SUFFIX) {
			(site, SiteAccessLevel::Admin)
		} else if let Some(site) = rest.strip_suffix(VIEW_KEY_SUFFIX) {
			(site, SiteAccessLevel::View)
		} else {
			return Err(EntitlementKeyError::UnknownLevel(key.to_string()));
		};

		let site_id = site
			.parse::<SiteId>()
			.map_err(|source| EntitlementKeyError::InvalidSiteId {
				key: key.to_string(),
				source,
			})?;

		Ok(Self { site_id, level })
	}
}

impl fmt::Display for EntitlementKey {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let suffix = match self.level {
			SiteAccessLevel::Admin => ADMIN_KEY_SUFFIX,
			SiteAccessLevel::View => VIEW_KEY_SUFFIX,
		};
		write!(f, "{SITE_KEY_PREFIX}{}{suffix}", self.site_id)
	}
}

/// Normalized entitlement configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntitlementConfiguration {
	pub superuser_group_dn: Option<String>,
	/// In key enumeration order.
	pub site_entitlements: Vec<SiteEntitlement>,
}

impl EntitlementConfiguration {
	/// Reads entitlements from raw key/value pairs in enumeration order.
	pub fn load<'a, I>(raw: I) -> Self
	where
		I: IntoIterator<Item = (&'a str, &'a str)>,
	{
		let mut config = EntitlementConfiguration::default();

		for (key, value) in raw {
			let value = value.trim();

			if key == SUPERUSER_DN_KEY {
				config.superuser_group_dn = Some(value.to_string()).filter(|dn| !dn.is_empty());
				continue;
			}

			if !key.starts_with(SITE_KEY_PREFIX) || value.is_empty() {
				continue;
			}

			match key.parse::<EntitlementKey>() {
				Ok(parsed) => config
					.site_entitlements
					.push(SiteEntitlement::new(parsed.site_id, parsed.level, value)),
				Err(e) => debug!(key, error = %e, "skipping malformed entitlement key"),
			}
		}

		config
	}

	/// The ordered directive list: superuser, then admins, then views.
	pub fn directives(&self) -> DirectiveSet {
		DirectiveSet::new(self.superuser_group_dn.as_deref(), &self.site_entitlements)
	}

	/// The configured group for one slot, if any.
	pub fn group_dn(&self, key: EntitlementKey) -> Option<&str> {
		self
			.site_entitlements
			.iter()
			.rev()
			.find(|e| e.site_id == key.site_id && e.level == key.level)
			.map(|e| e.group_dn.as_str())
	}

	/// One admin slot and one view slot per site, in the order given.
	pub fn slots_for_sites(&self, sites: &[SiteId]) -> Vec<EntitlementSlot> {
		sites
			.iter()
			.flat_map(|&site_id| {
				SiteAccessLevel::all().iter().map(move |&level| {
					EntitlementKey::new(site_id, level)
				})
			})
			.map(|key| EntitlementSlot {
				key: key.to_string(),
				site_id: key.site_id,
				level: key.level,
				group_dn: self.group_dn(key).map(str::to_string),
			})
			.collect()
	}
}

/// A configurable entitlement position, filled or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntitlementSlot {
	pub key: String,
	pub site_id: SiteId,
	pub level: SiteAccessLevel,
	pub group_dn: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use sitegate_core::{AccessLevel, Grant};

	mod key {
		use super::*;

		#[test]
		fn parses_admin_and_view() {
			let admin: EntitlementKey = "entitlements_site_5_admin_dn".parse().unwrap();
			assert_eq!(admin, EntitlementKey::new(SiteId::new(5), SiteAccessLevel::Admin));

			let view: EntitlementKey = "entitlements_site_12_view_dn".parse().unwrap();
			assert_eq!(view, EntitlementKey::new(SiteId::new(12), SiteAccessLevel::View));
		}

		#[test]
		fn rejects_malformed() {
			assert!(matches!(
				"login_ldap_superuser".parse::<EntitlementKey>(),
				Err(EntitlementKeyError::NotEntitlementKey(_))
			));
			assert!(matches!(
				"entitlements_site_5_owner_dn".parse::<EntitlementKey>(),
				Err(EntitlementKeyError::UnknownLevel(_))
			));
			assert!(matches!(
				"entitlements_site_abc_admin_dn".parse::<EntitlementKey>(),
				Err(EntitlementKeyError::InvalidSiteId { .. })
			));
			assert!(matches!(
				"entitlements_site__view_dn".parse::<EntitlementKey>(),
				Err(EntitlementKeyError::InvalidSiteId { .. })
			));
			assert!("entitlements_site_-1_admin_dn".parse::<EntitlementKey>().is_err());
		}

		proptest! {
			#[test]
			fn display_parses_back(site in any::<u32>(), admin in any::<bool>()) {
				let level = if admin { SiteAccessLevel::Admin } else { SiteAccessLevel::View };
				let key = EntitlementKey::new(SiteId::new(site), level);
				prop_assert_eq!(key.to_string().parse::<EntitlementKey>().unwrap(), key);
			}
		}
	}

	mod loader {
		use super::*;

		#[test]
		fn orders_superuser_admins_views() {
			let config = EntitlementConfiguration::load([
				("entitlements_site_1_view_dn", "cn=V1,dc=org"),
				("entitlements_site_2_admin_dn", "cn=A2,dc=org"),
				("entitlements_superuser_dn", "cn=SU,dc=org"),
				("entitlements_site_1_admin_dn", "cn=A1,dc=org"),
			]);
			let directives = config.directives();
			let grants: Vec<Grant> = directives.iter().map(|d| d.grant()).collect();
			assert_eq!(
				grants,
				[
					Grant::Superuser,
					Grant::Admin(SiteId::new(2)),
					Grant::Admin(SiteId::new(1)),
					Grant::View(SiteId::new(1)),
				]
			);
		}

		#[test]
		fn skips_malformed_and_blank() {
			let config = EntitlementConfiguration::load([
				("entitlements_site_abc_admin_dn", "cn=Bad,dc=org"),
				("entitlements_site_3_admin_dn", "   "),
				("entitlements_site_4_view_dn", "cn=Four,dc=org"),
				("required_member_of_field", "memberOf"),
				("entitlements_superuser_dn", ""),
			]);
			assert!(config.superuser_group_dn.is_none());
			assert_eq!(
				config.site_entitlements,
				[SiteEntitlement::new(SiteId::new(4), SiteAccessLevel::View, "cn=Four,dc=org")]
			);
			assert!(config
				.directives()
				.iter()
				.all(|d| d.access_level() != AccessLevel::Superuser));
		}

		#[test]
		fn slots_cover_admin_then_view_per_site() {
			let config = EntitlementConfiguration::load([("entitlements_site_7_view_dn", "cn=Seven,dc=org")]);
			let slots = config.slots_for_sites(&[SiteId::new(7), SiteId::new(8)]);
			let keys: Vec<&str> = slots.iter().map(|s| s.key.as_str()).collect();
			assert_eq!(
				keys,
				[
					"entitlements_site_7_admin_dn",
					"entitlements_site_7_view_dn",
					"entitlements_site_8_admin_dn",
					"entitlements_site_8_view_dn",
				]
			);
			assert_eq!(slots[0].group_dn, None);
			assert_eq!(slots[1].group_dn.as_deref(), Some("cn=Seven,dc=org"));
		}

		proptest! {
			/// Arbitrary keys never make the loader fail, and everything it keeps
			/// came from a well-formed key with a non-blank value.
			#[test]
			fn loader_never_panics(entries in proptest::collection::vec(
				("entitlements_site_[0-9a-z]{0,4}_(admin|view|x)_dn", "[ a-z=,]{0,12}"),
				0..16,
			)) {
				let config = EntitlementConfiguration::load(
					entries.iter().map(|(k, v)| (k.as_str(), v.as_str())),
				);
				for entitlement in &config.site_entitlements {
					prop_assert!(!entitlement.group_dn.trim().is_empty());
				}
				prop_assert!(config.site_entitlements.len() <= entries.len());
			}
		}
	}
}
