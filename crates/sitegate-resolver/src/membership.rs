// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Group membership checks for a single user and group.
//!
//! Membership is first checked against the user's own member-of attribute.
//! Directory servers such as Active Directory do not list groups reached
//! through nesting there, so when the direct check fails the resolver can ask
//! the directory with the in-chain matching rule instead.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use sitegate_core::{dn, DirectoryUserRecord};
use sitegate_directory::{DirectoryError, DirectoryQuery, Filter, SearchRequest};
use tracing::debug;

use crate::error::MembershipError;

pub const DEFAULT_MEMBER_OF_FIELD: &str = "memberOf";
pub const DEFAULT_NETWORK_TIMEOUT: Duration = Duration::from_secs(15);

/// Attribute the in-chain rule is applied to. Independent of the attribute
/// used for the direct check.
pub const IN_CHAIN_MEMBER_OF_FIELD: &str = "memberOf";

struct RecursiveLookup {
	directory: Arc<dyn DirectoryQuery>,
	base_dn: String,
}

pub struct MembershipResolver {
	member_of_field: String,
	network_timeout: Duration,
	recursive: Option<RecursiveLookup>,
}

impl Default for MembershipResolver {
	fn default() -> Self {
		Self::new(DEFAULT_MEMBER_OF_FIELD, DEFAULT_NETWORK_TIMEOUT)
	}
}

impl MembershipResolver {
	/// A resolver that only checks direct membership.
	pub fn new(member_of_field: impl Into<String>, network_timeout: Duration) -> Self {
		Self {
			member_of_field: member_of_field.into(),
			network_timeout,
			recursive: None,
		}
	}

	/// Enables the recursive fallback, searching below `base_dn`.
	pub fn with_directory(
		mut self,
		directory: Arc<dyn DirectoryQuery>,
		base_dn: impl Into<String>,
	) -> Self {
		self.recursive = Some(RecursiveLookup {
			directory,
			base_dn: base_dn.into(),
		});
		self
	}

	pub fn member_of_field(&self) -> &str {
		&self.member_of_field
	}

	pub fn network_timeout(&self) -> Duration {
		self.network_timeout
	}

	pub fn has_directory(&self) -> bool {
		self.recursive.is_some()
	}

	/// Direct membership, then the recursive fallback if the direct check fails.
	pub async fn is_member(
		&self,
		user: &DirectoryUserRecord,
		group_dn: &str,
	) -> Result<bool, MembershipError> {
		if self.is_direct_member(user, group_dn) {
			return Ok(true);
		}
		self.is_recursive_member(user, group_dn).await
	}

	/// Case-insensitive lookup of `group_dn` in the member-of attribute. A missing
	/// attribute means no direct memberships.
	pub fn is_direct_member(&self, user: &DirectoryUserRecord, group_dn: &str) -> bool {
		let wanted = dn::normalize(group_dn);
		user
			.attribute(&self.member_of_field)
			.unwrap_or_default()
			.iter()
			.any(|value| dn::normalize(value) == wanted)
	}

	/// Binds as administrator and searches for the user with the in-chain
	/// matching rule against `group_dn`.
	///
	/// Returns `Ok(false)` without touching the directory when no directory is
	/// configured or the user's DN has no `cn` first RDN to search by.
	pub async fn is_recursive_member(
		&self,
		user: &DirectoryUserRecord,
		group_dn: &str,
	) -> Result<bool, MembershipError> {
		let Some(lookup) = &self.recursive else {
			debug!(group_dn, "no directory configured, skipping recursive membership check");
			return Ok(false);
		};

		let Some(common_name) = dn::common_name(user.dn()) else {
			debug!(
				user_dn = user.dn(),
				"user DN has no common name, cannot check nested membership"
			);
			return Ok(false);
		};

		let request = SearchRequest::new(
			lookup.base_dn.clone(),
			transitive_membership_filter(&common_name, group_dn),
		)
		.with_attributes(["dn"]);

		self
			.with_timeout("bind", lookup.directory.bind_as_administrator())
			.await
			.map_err(MembershipError::AdministratorBind)?;

		let entries = self
			.with_timeout("search", lookup.directory.search(&request))
			.await
			.map_err(MembershipError::Search)?;

		let found = entries.iter().any(|entry| dn::eq(&entry.dn, user.dn()));
		debug!(
			group_dn,
			filter = %request.filter,
			returned = entries.len(),
			found,
			"recursive membership search complete"
		);
		Ok(found)
	}

	async fn with_timeout<T, F>(&self, operation: &'static str, call: F) -> Result<T, DirectoryError>
	where
		F: Future<Output = Result<T, DirectoryError>>,
	{
		tokio::time::timeout(self.network_timeout, call)
			.await
			.map_err(|_| DirectoryError::Timeout {
				operation,
				after: self.network_timeout,
			})?
	}
}

/// `(&(objectCategory=Person)(cn=<cn>)(memberOf:1.2.840.113556.1.4.1941:=<group>))`
pub fn transitive_membership_filter(common_name: &str, group_dn: &str) -> Filter {
	Filter::and([
		Filter::eq("objectCategory", "Person"),
		Filter::eq("cn", common_name),
		Filter::in_chain(IN_CHAIN_MEMBER_OF_FIELD, group_dn),
	])
}
