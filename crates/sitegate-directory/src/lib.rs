// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Directory query facade for sitegate.
//!
//! The resolver never talks to a directory server directly. It goes through
//! [`DirectoryQuery`], which exposes exactly two capabilities: an
//! administrative bind and a subtree search. Implementations:
//!
//! - `sitegate-directory-ldap`: a real LDAP server via `ldap3`
//! - [`MemoryDirectory`]: in-process entries, used by tests and offline tooling
//!
//! Search filters are modelled as a [`Filter`] tree and rendered to RFC 4515
//! text with value escaping, so DNs and names taken from user entries cannot
//! change the shape of a query.

pub mod entry;
pub mod error;
pub mod filter;
pub mod memory;
pub mod query;

pub use entry::DirectoryEntry;
pub use error::DirectoryError;
pub use filter::{
	escape_value, evaluate_filter, CompareOp, Filter, FilterParseError, FilterParser, FilterTarget,
	MATCHING_RULE_IN_CHAIN,
};
pub use memory::MemoryDirectory;
pub use query::{DirectoryQuery, SearchRequest};
