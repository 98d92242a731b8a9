// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use sitegate_directory::DirectoryError;

/// Why a recursive membership check could not be completed.
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
	/// The administrative bind failed or timed out. Retrying within the same
	/// run is pointless.
	#[error("administrative bind failed: {0}")]
	AdministratorBind(#[source] DirectoryError),

	/// The transitive membership search failed or timed out.
	#[error("recursive membership search failed: {0}")]
	Search(#[source] DirectoryError),
}

impl MembershipError {
	pub fn is_bind_failure(&self) -> bool {
		matches!(self, MembershipError::AdministratorBind(_))
	}
}
