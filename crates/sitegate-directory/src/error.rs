// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::time::Duration;

use crate::filter::FilterParseError;

/// Errors returned by [`DirectoryQuery`](crate::DirectoryQuery) implementations.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
	#[error("failed to connect to directory at {url}: {message}")]
	Connect { url: String, message: String },

	#[error("administrative bind as '{bind_dn}' failed: {message}")]
	Bind { bind_dn: String, message: String },

	#[error("search under '{base_dn}' failed: {message}")]
	Search { base_dn: String, message: String },

	#[error("directory {operation} timed out after {after:?}")]
	Timeout {
		operation: &'static str,
		after: Duration,
	},

	#[error(transparent)]
	InvalidFilter(#[from] FilterParseError),
}
