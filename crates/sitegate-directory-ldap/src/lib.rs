// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! [`DirectoryQuery`](sitegate_directory::DirectoryQuery) over a real LDAP
//! server, using the `ldap3` async client.

mod directory;

pub use directory::{LdapDirectory, LdapSettings};
