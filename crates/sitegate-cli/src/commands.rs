// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use sitegate_config::{EntitlementSlot, SitegateConfig};
use sitegate_core::{AccessResult, DirectiveSet, DirectoryUserRecord, SiteId};
use sitegate_directory::DirectoryQuery;
use sitegate_directory_ldap::{LdapDirectory, LdapSettings};
use sitegate_resolver::{AccessAggregator, MembershipResolver};
use tracing::{info, warn};

pub fn directives(config: &SitegateConfig) -> DirectiveSet {
	config.login_ldap.entitlements().directives()
}

pub fn slots(config: &SitegateConfig, sites: &[SiteId]) -> Vec<EntitlementSlot> {
	config.login_ldap.entitlements().slots_for_sites(sites)
}

/// Looks `login` up in the configured directory and resolves its access.
pub async fn resolve_login(config: &SitegateConfig, login: &str) -> Result<AccessResult> {
	let Some(directory) = ldap_directory(config)? else {
		bail!("no directory configured; set [directory] url and base_dn");
	};

	let user = directory
		.find_user(login)
		.await
		.with_context(|| format!("failed to look up '{login}'"))?
		.with_context(|| format!("user '{login}' not found"))?;

	info!(login, user_dn = user.dn(), "resolving directory user");
	Ok(resolve(config, &user, Some(directory)).await)
}

/// Resolves a user record read from a JSON file. Without a configured
/// directory only direct membership is evaluated.
pub async fn resolve_record(config: &SitegateConfig, path: &Path) -> Result<AccessResult> {
	let content = std::fs::read_to_string(path)
		.with_context(|| format!("failed to read {}", path.display()))?;
	let user: DirectoryUserRecord = serde_json::from_str(&content)
		.with_context(|| format!("invalid user record in {}", path.display()))?;

	let directory = ldap_directory(config)?;
	if directory.is_none() {
		warn!("no directory configured, nested group membership will not be checked");
	}
	Ok(resolve(config, &user, directory).await)
}

async fn resolve(
	config: &SitegateConfig,
	user: &DirectoryUserRecord,
	directory: Option<Arc<LdapDirectory>>,
) -> AccessResult {
	let mut resolver = MembershipResolver::new(
		config.login_ldap.required_member_of_field.clone(),
		config.login_ldap.network_timeout,
	);
	if let (Some(directory), Some(directory_config)) = (directory, &config.directory) {
		let directory: Arc<dyn DirectoryQuery> = directory;
		resolver = resolver.with_directory(directory, directory_config.base_dn.clone());
	}

	AccessAggregator::new(resolver)
		.resolve(user, &directives(config))
		.await
}

fn ldap_directory(config: &SitegateConfig) -> Result<Option<Arc<LdapDirectory>>> {
	let Some(directory_config) = &config.directory else {
		return Ok(None);
	};
	let settings = LdapSettings::from_config(directory_config, config.login_ldap.network_timeout)
		.context("invalid [directory] configuration")?;
	Ok(Some(Arc::new(LdapDirectory::new(settings))))
}
