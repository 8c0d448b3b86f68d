// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Node connection seam and its alloy-backed implementation.

use alloy::network::Ethereum;
use alloy::primitives::{Address, B256, U256};
use alloy::providers::{Provider, RootProvider};
use alloy::rpc::types::{BlockNumberOrTag, SyncStatus};
use async_trait::async_trait;
use url::Url;

use super::erc20;
use crate::config::DEFAULT_NODE_HOST;

/// Self-reported progress of a node that is still importing blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncProgress {
    pub current_block: u64,
    pub highest_block: u64,
}

/// The slice of a block header that callers of `get_block_by_number` use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub hash: B256,
    pub parent_hash: B256,
    pub timestamp: u64,
}

/// Errors from the local node path.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The node could not be reached at all.
    #[error("node transport error: {0}")]
    Transport(String),

    /// The node answered, but the RPC call failed.
    #[error("node rpc error: {0}")]
    Rpc(String),

    /// A contract call through the node failed.
    #[error("contract call failed: {0}")]
    Contract(String),
}

/// The primitives the connection manager needs from a live node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Hash of block 0, used to verify which network the node is on.
    async fn genesis_hash(&self) -> Result<B256, NodeError>;

    /// `Some` while the node reports itself mid-sync, `None` once caught up.
    async fn sync_progress(&self) -> Result<Option<SyncProgress>, NodeError>;

    /// The node's own head block number.
    async fn head_block_number(&self) -> Result<u64, NodeError>;

    /// Native balance of an address, in wei.
    async fn eth_balance(&self, address: Address) -> Result<U256, NodeError>;

    /// ERC-20 balance of a holder, in the token's smallest unit.
    async fn token_balance_of(&self, token: Address, holder: Address) -> Result<U256, NodeError>;

    /// Block header by number, `None` if the node does not have it.
    async fn block_by_number(&self, number: u64) -> Result<Option<BlockInfo>, NodeError>;
}

/// Opens node connections by port.
///
/// The manager owns exactly one connector and asks it for a fresh connection
/// on every (non-idempotent) `connect` call, after dropping the old handle.
#[async_trait]
pub trait NodeConnector: Send + Sync {
    type Node: NodeClient;

    /// Open a connection to the node listening on `port`. Implementations
    /// must probe the transport so that "no listener" fails here rather than
    /// on the first query.
    async fn open(&self, port: u16) -> Result<Self::Node, NodeError>;
}

/// Connects to a node over plain HTTP JSON-RPC on a fixed host.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    host: String,
}

impl HttpConnector {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(DEFAULT_NODE_HOST)
    }
}

#[async_trait]
impl NodeConnector for HttpConnector {
    type Node = EthNode;

    async fn open(&self, port: u16) -> Result<EthNode, NodeError> {
        EthNode::connect(&self.host, port).await
    }
}

/// Live connection to an Ethereum node over alloy's HTTP provider.
pub struct EthNode {
    provider: RootProvider<Ethereum>,
}

impl EthNode {
    /// Build a provider for `http://{host}:{port}` and probe it with a head
    /// block request, so an unreachable node fails at connect time.
    pub async fn connect(host: &str, port: u16) -> Result<Self, NodeError> {
        let url: Url = format!("http://{host}:{port}")
            .parse()
            .map_err(|e: url::ParseError| NodeError::Transport(e.to_string()))?;
        let provider = RootProvider::<Ethereum>::new_http(url);

        provider
            .get_block_number()
            .await
            .map_err(|e| NodeError::Transport(e.to_string()))?;

        Ok(Self { provider })
    }
}

#[async_trait]
impl NodeClient for EthNode {
    async fn genesis_hash(&self) -> Result<B256, NodeError> {
        let genesis = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(0))
            .await
            .map_err(|e| NodeError::Rpc(e.to_string()))?
            .ok_or_else(|| NodeError::Rpc("node returned no genesis block".into()))?;
        Ok(genesis.header.hash)
    }

    async fn sync_progress(&self) -> Result<Option<SyncProgress>, NodeError> {
        match self
            .provider
            .syncing()
            .await
            .map_err(|e| NodeError::Rpc(e.to_string()))?
        {
            SyncStatus::Info(info) => Ok(Some(SyncProgress {
                current_block: info.current_block.to::<u64>(),
                highest_block: info.highest_block.to::<u64>(),
            })),
            SyncStatus::None => Ok(None),
        }
    }

    async fn head_block_number(&self) -> Result<u64, NodeError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| NodeError::Rpc(e.to_string()))
    }

    async fn eth_balance(&self, address: Address) -> Result<U256, NodeError> {
        self.provider
            .get_balance(address)
            .await
            .map_err(|e| NodeError::Rpc(e.to_string()))
    }

    async fn token_balance_of(&self, token: Address, holder: Address) -> Result<U256, NodeError> {
        erc20::balance_of(&self.provider, token, holder).await
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<BlockInfo>, NodeError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await
            .map_err(|e| NodeError::Rpc(e.to_string()))?;
        Ok(block.map(|b| BlockInfo {
            number: b.header.number,
            hash: b.header.hash,
            parent_hash: b.header.parent_hash,
            timestamp: b.header.timestamp,
        }))
    }
}
