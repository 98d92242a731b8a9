// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::sync::Arc;

use async_trait::async_trait;

use crate::entry::DirectoryEntry;
use crate::error::DirectoryError;
use crate::filter::Filter;

/// A subtree search below `base_dn`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
	pub base_dn: String,
	pub filter: Filter,
	/// Attributes to return. `dn` requests no attributes beyond the entry DN.
	pub attributes: Vec<String>,
}

impl SearchRequest {
	pub fn new(base_dn: impl Into<String>, filter: Filter) -> Self {
		Self {
			base_dn: base_dn.into(),
			filter,
			attributes: vec!["*".to_string()],
		}
	}

	pub fn with_attributes<I, S>(mut self, attributes: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.attributes = attributes.into_iter().map(Into::into).collect();
		self
	}
}

/// The directory capabilities the resolver consumes.
///
/// Implementations own their connection handling; concurrent use of one
/// instance is allowed only as far as the implementation documents it.
#[async_trait]
pub trait DirectoryQuery: Send + Sync {
	/// Binds with the configured administrative credentials.
	async fn bind_as_administrator(&self) -> Result<(), DirectoryError>;

	/// Runs a subtree search.
	async fn search(&self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError>;
}

#[async_trait]
impl<T> DirectoryQuery for Arc<T>
where
	T: DirectoryQuery + ?Sized,
{
	async fn bind_as_administrator(&self) -> Result<(), DirectoryError> {
		(**self).bind_as_administrator().await
	}

	async fn search(&self, request: &SearchRequest) -> Result<Vec<DirectoryEntry>, DirectoryError> {
		(**self).search(request).await
	}
}
