// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ethchain - Ethereum balance queries with node/explorer failover
//!
//! A unified balance-query interface for an Ethereum account and its ERC-20
//! holdings. Queries are answered by a locally reachable full node when one
//! has been connected, verified against the mainnet genesis hash and found
//! within the freshness window of the chain tip; otherwise they fall back to
//! remote block-explorer APIs. Both paths return the same decimal-normalized
//! amounts, so callers are source-agnostic.
//!
//! ## Modules
//!
//! - `manager` - connect/health-check state machine and query routing
//! - `node` - local node seam and alloy-backed implementation
//! - `explorer` - remote block-explorer HTTP client
//! - `units` - smallest-unit to display-unit conversion
//! - `config` - tunable constants and defaults
//!
//! ```rust,no_run
//! use ethchain::{ConnectionManager, ExplorerClient, ExplorerConfig};
//!
//! # async fn run() {
//! let explorer = ExplorerClient::new(ExplorerConfig::default());
//! let mut manager = ConnectionManager::over_local_http(explorer);
//!
//! // Degrades to the explorer when no local node validates.
//! let (connected, message) = manager.connect(8545, true).await;
//! if !connected {
//!     tracing::info!(%message, "no usable local node");
//! }
//! let balance = manager
//!     .get_eth_balance("0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045".parse().unwrap())
//!     .await;
//! # let _ = balance;
//! # }
//! ```

pub mod config;
pub mod error;
pub mod explorer;
pub mod manager;
pub mod node;
pub mod units;

pub use error::{ConfigError, QueryError};
pub use explorer::{ExplorerClient, ExplorerConfig, ExplorerError};
pub use manager::{
    is_synchronized, BalanceMap, ConnectionManager, ConnectivityState, TokenDescriptor,
};
pub use node::{
    BlockInfo, EthNode, HttpConnector, NodeClient, NodeConnector, NodeError, SyncProgress,
};
