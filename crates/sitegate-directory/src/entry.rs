// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::BTreeMap;

use sitegate_core::{AttributeValues, DirectoryUserRecord};

/// One entry returned by a directory search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
	pub dn: String,
	attributes: BTreeMap<String, Vec<String>>,
}

impl DirectoryEntry {
	pub fn new(dn: impl Into<String>) -> Self {
		Self {
			dn: dn.into(),
			attributes: BTreeMap::new(),
		}
	}

	pub fn with_attribute(mut self, name: impl AsRef<str>, values: impl Into<AttributeValues>) -> Self {
		self.insert_attribute(name, values);
		self
	}

	pub fn insert_attribute(&mut self, name: impl AsRef<str>, values: impl Into<AttributeValues>) {
		self
			.attributes
			.entry(name.as_ref().to_lowercase())
			.or_default()
			.extend(values.into().into_vec());
	}

	/// Case-insensitive attribute lookup.
	pub fn attribute(&self, name: &str) -> Option<&[String]> {
		self
			.attributes
			.get(&name.to_lowercase())
			.map(Vec::as_slice)
	}

	pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
		self.attributes.keys().map(String::as_str)
	}

	/// Keeps only the named attributes. `*` keeps everything; `dn` names no
	/// attribute and so keeps nothing on its own.
	pub fn project(mut self, requested: &[String]) -> Self {
		if requested.iter().any(|a| a == "*") {
			return self;
		}
		let wanted: Vec<String> = requested.iter().map(|a| a.to_lowercase()).collect();
		self.attributes.retain(|name, _| wanted.contains(name));
		self
	}

	pub fn into_user_record(self) -> DirectoryUserRecord {
		self
			.attributes
			.into_iter()
			.fold(DirectoryUserRecord::new(self.dn), |record, (name, values)| {
				record.with_attribute(name, values)
			})
	}
}
