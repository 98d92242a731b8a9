// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

pub mod ast;
pub mod eval;
pub mod parser;

pub use ast::{escape_value, CompareOp, Filter, MATCHING_RULE_IN_CHAIN};
pub use eval::{evaluate_filter, FilterTarget};
pub use parser::{FilterParseError, FilterParser};
