// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Evaluates an ordered directive list into an [`AccessResult`].
//!
//! One call to [`AccessAggregator::resolve`] is one resolution run: a single
//! pass over the directives that either stops at the first matching
//! superuser directive or collects admin and view grants. Directory failures
//! never abort a run; an unprovable membership simply grants nothing.

use sitegate_core::{AccessResult, DirectiveSet, DirectoryUserRecord, Grant, SiteGrants};
use tracing::{debug, instrument, warn};

use crate::error::MembershipError;
use crate::membership::MembershipResolver;

pub struct AccessAggregator {
	resolver: MembershipResolver,
}

/// State scoped to one resolution run.
#[derive(Debug, Default)]
struct RunState {
	/// Set after the first administrative bind failure; disables the
	/// recursive fallback for the rest of the run.
	bind_failed: bool,
}

impl AccessAggregator {
	pub fn new(resolver: MembershipResolver) -> Self {
		Self { resolver }
	}

	pub fn resolver(&self) -> &MembershipResolver {
		&self.resolver
	}

	#[instrument(level = "debug", skip(self, user, directives), fields(user_dn = %user.dn(), directives = directives.len()))]
	pub async fn resolve(&self, user: &DirectoryUserRecord, directives: &DirectiveSet) -> AccessResult {
		let mut run = RunState::default();
		let mut grants = SiteGrants::new();

		for directive in directives {
			let group_dn = directive.group_dn();
			if !self.check_membership(user, group_dn, &mut run).await {
				debug!(group_dn, level = %directive.access_level(), "not a member");
				continue;
			}

			match directive.grant() {
				Grant::Superuser => {
					debug!(group_dn, "superuser group matched");
					return AccessResult::Superuser;
				}
				Grant::Admin(site_id) => {
					debug!(group_dn, site_id = %site_id, "admin grant");
					grants.grant_admin(site_id);
				}
				Grant::View(site_id) => {
					if grants.grant_view(site_id) {
						debug!(group_dn, site_id = %site_id, "view grant");
					} else {
						debug!(group_dn, site_id = %site_id, "view grant skipped, site already admin");
					}
				}
			}
		}

		let result = AccessResult::Sites(grants);
		debug!(?result, "resolution complete");
		result
	}

	async fn check_membership(
		&self,
		user: &DirectoryUserRecord,
		group_dn: &str,
		run: &mut RunState,
	) -> bool {
		if self.resolver.is_direct_member(user, group_dn) {
			return true;
		}
		if run.bind_failed {
			return false;
		}

		match self.resolver.is_recursive_member(user, group_dn).await {
			Ok(member) => member,
			Err(MembershipError::AdministratorBind(e)) => {
				warn!(
					error = %e,
					"administrative bind failed, skipping recursive membership checks for the rest of this run"
				);
				run.bind_failed = true;
				false
			}
			Err(e @ MembershipError::Search(_)) => {
				warn!(group_dn, error = %e, "recursive membership search failed, treating as not a member");
				false
			}
		}
	}
}
