// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Tunable Constants
//!
//! Named defaults for the connect/health-check machinery and the remote
//! explorer client. These are policy knobs, not domain laws: the freshness
//! window and the multi-balance batch sizing can be overridden per instance
//! (see [`crate::manager::ConnectionManager::with_sync_tolerance`] and
//! [`crate::explorer::ExplorerConfig`]), but default to the values below.

use alloy::primitives::{b256, B256};

/// Hash of block 0 on the Ethereum mainnet.
///
/// A freshly connected node must report exactly this genesis hash before it
/// is trusted; anything else is a testnet or a private chain.
pub const MAINNET_GENESIS_HASH: B256 =
    b256!("0xd4e56740f876aef8c010b86a40d5f56745a118d0906a34e69aec8c0db1cb8fa3");

/// Maximum block-height lag between a local node's head and the chain tip
/// for the node to still count as synchronized.
///
/// Normal propagation lag rarely exceeds this.
pub const DEFAULT_SYNC_TOLERANCE_BLOCKS: u64 = 20;

/// Address-count threshold above which remote multi-balance queries are
/// split into groups instead of being sent as one request.
pub const DEFAULT_MULTI_BATCH_THRESHOLD: usize = 20;

/// Group size for split remote multi-balance queries.
pub const DEFAULT_MULTI_BATCH_SIZE: usize = 2;

/// Decimal places of the native coin (wei per ETH).
pub const ETH_DECIMALS: u32 = 18;

/// Default etherscan-compatible balance API endpoint.
pub const DEFAULT_EXPLORER_API_URL: &str = "https://api.etherscan.io/api";

/// Default blockcypher-style chain endpoint used for the tip height.
pub const DEFAULT_CHAIN_HEIGHT_URL: &str = "https://api.blockcypher.com/v1/eth/main";

/// Host a local node is expected to listen on.
pub const DEFAULT_NODE_HOST: &str = "127.0.0.1";
