// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crate-level error taxonomy.
//!
//! Connectivity problems are deliberately absent here: "node unavailable" is
//! an expected, recoverable condition that the connection manager reports as
//! a `(false, message)` connect result and routes around, not an error type
//! that propagates out of queries.

use crate::explorer::ExplorerError;
use crate::node::NodeError;

/// Failure of a balance query, from whichever source was authoritative.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error(transparent)]
    Node(#[from] NodeError),

    #[error(transparent)]
    Explorer(#[from] ExplorerError),
}

/// Invalid construction-time configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}
