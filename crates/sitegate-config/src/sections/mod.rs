// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sections for sitegate.

pub mod directory;
pub mod logging;
pub mod login_ldap;

pub use directory::{DirectoryConfig, DirectoryConfigLayer};
pub use logging::{LoggingConfig, LoggingConfigLayer};
pub use login_ldap::{LoginLdapConfig, LoginLdapConfigLayer};
