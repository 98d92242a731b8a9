// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Group-to-site access resolution.
//!
//! [`MembershipResolver`] answers "is this user in this group", directly from
//! the user's member-of attribute or through a transitive directory search.
//! [`AccessAggregator`] walks a [`DirectiveSet`](sitegate_core::DirectiveSet)
//! with it and produces the user's [`AccessResult`](sitegate_core::AccessResult).
//!
//! ```ignore
//! let resolver = MembershipResolver::new("memberOf", Duration::from_secs(15))
//!     .with_directory(directory, "dc=org,dc=com");
//! let access = AccessAggregator::new(resolver).resolve(&user, &directives).await;
//! ```

pub mod aggregator;
pub mod error;
pub mod membership;

pub use aggregator::AccessAggregator;
pub use error::MembershipError;
pub use membership::{
	transitive_membership_filter, MembershipResolver, DEFAULT_MEMBER_OF_FIELD, DEFAULT_NETWORK_TIMEOUT,
	IN_CHAIN_MEMBER_OF_FIELD,
};
