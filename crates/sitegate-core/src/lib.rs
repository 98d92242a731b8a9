// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core types for resolving site access from directory group membership.
//!
//! This crate defines the data model shared by the configuration loader, the
//! membership resolver and the access aggregator:
//!
//! - [`SiteId`]: identifier of an analytics site
//! - [`GroupPermissionDirective`] and [`DirectiveSet`]: the ordered rule list
//!   mapping directory groups to superuser, admin or view access
//! - [`DirectoryUserRecord`]: a user entry as fetched from the directory
//! - [`AccessResult`]: the outcome of a resolution run
//! - [`dn`]: helpers for distinguished-name handling

pub mod access;
pub mod directive;
pub mod dn;
pub mod site;
pub mod user;

pub use access::{AccessResult, SiteGrants};
pub use directive::{AccessLevel, DirectiveSet, Grant, GroupPermissionDirective, SiteAccessLevel, SiteEntitlement};
pub use site::{ParseSiteIdError, SiteId};
pub use user::{AttributeValues, DirectoryUserRecord};
