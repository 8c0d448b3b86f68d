// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Local Ethereum node integration.
//!
//! The connection manager talks to the node through the narrow
//! [`NodeClient`]/[`NodeConnector`] seams so the state machine can be
//! exercised without a running node; [`EthNode`] is the production
//! implementation over alloy's HTTP provider.

mod connection;
mod erc20;

pub use connection::{
    BlockInfo, EthNode, HttpConnector, NodeClient, NodeConnector, NodeError, SyncProgress,
};
