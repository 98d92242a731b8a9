// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! An in-process directory.
//!
//! Searches evaluate the parsed [`Filter`] against stored entries, including the
//! in-chain matching rule, which walks DN-valued attributes through the stored
//! entries. Call counters and failure injection let callers assert how often
//! and in which order the directory was used.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::entry::DirectoryEntry;
use crate::error::DirectoryError;
use crate::filter::{evaluate_filter, FilterTarget};
use crate::query::{DirectoryQuery, SearchRequest};

const ADMIN_BIND_DN: &str = "cn=admin";

#[derive(Debug, Default)]
pub struct MemoryDirectory {
	entries: Vec<DirectoryEntry>,
	by_dn: HashMap<String, usize>,
	bind_failure: Option<String>,
	failing_searches: AtomicUsize,
	latency: Option<Duration>,
	bind_calls: AtomicUsize,
	search_calls: AtomicUsize,
}

impl MemoryDirectory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an entry. A later entry with the same DN (case-insensitive) replaces
	/// the earlier one.
	pub fn with_entry(mut self, entry: DirectoryEntry) -> Self {
		self.insert(entry);
		self
	}

	pub fn insert(&mut self, entry: DirectoryEntry) {
		let key = entry.dn.to_lowercase();
		match self.by_dn.get(&key) {
			Some(&index) => self.entries[index] = entry,
			None => {
				self.by_dn.insert(key, self.entries.len());
				self.entries.push(entry);
			}
		}
	}

	/// Every administrative bind fails with `message`.
	pub fn with_bind_failure(mut self, message: impl Into<String>) -> Self {
		self.bind_failure = Some(message.into());
		self
	}

	/// The next `count` searches fail.
	pub fn with_failing_searches(self, count: usize) -> Self {
		self.failing_searches.store(count, Ordering::SeqCst);
		self
	}

	/// Every bind and search sleeps for `latency` before answering.
	pub fn with_latency(mut self, latency: Duration) -> Self {
		self.latency = Some(latency);
		self
	}

	pub fn bind_calls(&self) -> usize {
		self.bind_calls.load(Ordering::SeqCst)
	}

	pub fn search_calls(&self) -> usize {
		self.search_calls.load(Ordering::SeqCst)
	}

	pub fn entry(&self, dn: &str) -> Option<&DirectoryEntry> {
		self
			.by_dn
			.get(&dn.to_lowercase())
			.map(|&index| &self.entries[index])
	}

	async fn simulate_latency(&self) {
		if let Some(latency) = self.latency {
			tokio::time::sleep(latency).await;
		}
	}

	fn take_search_failure(&self) -> bool {
		self
			.failing_searches
			.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
			.is_ok()
	}
}

fn is_under(dn: &str, base_dn: &str) -> bool {
	let dn = dn.to_lowercase();
	let base = base_dn.to_lowercase();
	base.is_empty() || dn == base || dn.ends_with(&format!(",{base}"))
}

/// An entry viewed through the directory it lives in, so in-chain lookups can
/// follow links into other entries.
struct Linked<'a> {
	directory: &'a MemoryDirectory,
	entry: &'a DirectoryEntry,
}

impl FilterTarget for Linked<'_> {
	fn values(&self, attr: &str) -> &[String] {
		self.entry.values(attr)
	}

	fn in_chain(&self, attr: &str, dn: &str) -> bool {
		let target = dn.to_lowercase();
		let mut visited = HashSet::new();
		let mut queue: VecDeque<&str> = self.entry.values(attr).iter().map(String::as_str).collect();

		while let Some(current) = queue.pop_front() {
			let current_key = current.to_lowercase();
			if current_key == target {
				return true;
			}
			if !visited.insert(current_key) {
				continue;
			}
			if let Some(next) = self.directory.entry(current) {
				queue.extend(next.values(attr).iter().map(String::as_str));
			}
		}
		false
	}
}

#[async_trait]
impl DirectoryQuery for MemoryDirectory {
	async fn bind_as_administrator(&self) -> Result<(), DirectoryError> {
		self.bind_calls.fetch_add(1, Ordering::SeqCst);
		self.simulate_latency().await;

		match &self.bind_failure {
			Some(message) => Err(DirectoryError::Bind {
				bind_dn: ADMIN_BIND_DN.to_string(),
				message: message.clone(),
			}),
			None => Ok(()),
		}
	}

	async fn search(&self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError> {
		self.search_calls.fetch_add(1, Ordering::SeqCst);
		self.simulate_latency().await;

		if self.take_search_failure() {
			return Err(DirectoryError::Search {
				base_dn: request.base_dn.clone(),
				message: "injected search failure".to_string(),
			});
		}

		let results: Vec<DirectoryEntry> = self
			.entries
			.iter()
			.filter(|entry| is_under(&entry.dn, &request.base_dn))
			.filter(|entry| {
				evaluate_filter(
					&request.filter,
					&Linked {
						directory: self,
						entry,
					},
				)
			})
			.map(|entry| entry.clone().project(&request.attributes))
			.collect();

		debug!(
			base_dn = %request.base_dn,
			filter = %request.filter,
			results = results.len(),
			"memory directory search"
		);
		Ok(results)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::filter::Filter;

	const BASE: &str = "dc=org,dc=com";

	fn directory() -> MemoryDirectory {
		MemoryDirectory::new()
			.with_entry(
				DirectoryEntry::new("cn=Jane Doe,ou=Users,dc=org,dc=com")
					.with_attribute("objectCategory", "Person")
					.with_attribute("cn", "Jane Doe")
					.with_attribute("memberOf", "cn=Inner Group,ou=Groups,dc=org,dc=com"),
			)
			.with_entry(
				DirectoryEntry::new("cn=Inner Group,ou=Groups,dc=org,dc=com")
					.with_attribute("objectCategory", "Group")
					.with_attribute("memberOf", "cn=Outer Group,ou=Groups,dc=org,dc=com"),
			)
			.with_entry(
				DirectoryEntry::new("cn=Outer Group,ou=Groups,dc=org,dc=com")
					.with_attribute("objectCategory", "Group")
					.with_attribute("memberOf", "cn=Inner Group,ou=Groups,dc=org,dc=com"),
			)
			.with_entry(
				DirectoryEntry::new("cn=Elsewhere,dc=other,dc=com")
					.with_attribute("objectCategory", "Person"),
			)
	}

	fn transitive(group: &str) -> SearchRequest {
		SearchRequest::new(
			BASE,
			Filter::and([
				Filter::eq("objectCategory", "Person"),
				Filter::eq("cn", "Jane Doe"),
				Filter::in_chain("memberOf", group),
			]),
		)
		.with_attributes(["dn"])
	}

	#[tokio::test]
	async fn in_chain_follows_nested_groups() {
		let dir = directory();
		let results = dir
			.search(&transitive("cn=Outer Group,ou=Groups,dc=org,dc=com"))
			.await
			.unwrap();
		assert_eq!(results.len(), 1);
		assert_eq!(results[0].dn, "cn=Jane Doe,ou=Users,dc=org,dc=com");
		assert_eq!(results[0].attribute_names().count(), 0);
	}

	#[tokio::test]
	async fn in_chain_terminates_on_cycles() {
		let dir = directory();
		let results = dir
			.search(&transitive("cn=Unrelated,ou=Groups,dc=org,dc=com"))
			.await
			.unwrap();
		assert!(results.is_empty());
	}

	#[tokio::test]
	async fn search_is_scoped_to_base() {
		let dir = directory();
		let request = SearchRequest::new(BASE, Filter::eq("objectCategory", "Person"));
		let results = dir.search(&request).await.unwrap();
		assert_eq!(results.len(), 1);
	}

	#[tokio::test]
	async fn counts_calls_and_injects_failures() {
		let dir = directory()
			.with_bind_failure("invalid credentials")
			.with_failing_searches(1);

		assert!(matches!(
			dir.bind_as_administrator().await,
			Err(DirectoryError::Bind { .. })
		));
		let request = SearchRequest::new(BASE, Filter::present("cn"));
		assert!(dir.search(&request).await.is_err());
		assert!(dir.search(&request).await.is_ok());

		assert_eq!(dir.bind_calls(), 1);
		assert_eq!(dir.search_calls(), 2);
	}

	#[test]
	fn later_entry_replaces_same_dn() {
		let dir = MemoryDirectory::new()
			.with_entry(DirectoryEntry::new("cn=A,dc=org").with_attribute("mail", "old"))
			.with_entry(DirectoryEntry::new("CN=A,DC=ORG").with_attribute("mail", "new"));
		assert_eq!(dir.entry("cn=a,dc=org").unwrap().attribute("mail").unwrap(), ["new"]);
	}
}
