// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Connection manager: the connect/health-check state machine and all
//! balance-query routing.
//!
//! Every query goes through one branch rule: when a verified local node is
//! available it answers, otherwise the remote explorer does. Both paths
//! return decimal display units, so callers never see which source answered.
//!
//! The manager assumes a single logical caller: `connect`/`set_port` take
//! `&mut self`, so concurrent reconfiguration requires external
//! synchronization, while read-only queries borrow shared.

use std::collections::HashMap;

use alloy::primitives::Address;
use bigdecimal::{BigDecimal, Zero};
use futures::future;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_SYNC_TOLERANCE_BLOCKS, MAINNET_GENESIS_HASH};
use crate::error::QueryError;
use crate::explorer::ExplorerClient;
use crate::node::{BlockInfo, HttpConnector, NodeClient, NodeConnector};
use crate::units;

/// Balances keyed by account address, in display units.
pub type BalanceMap = HashMap<Address, BigDecimal>;

/// An ERC-20 token to query, supplied by the caller per query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenDescriptor {
    pub symbol: String,
    pub contract: Address,
    pub decimals: u32,
}

impl TokenDescriptor {
    pub fn new(symbol: impl Into<String>, contract: Address, decimals: u32) -> Self {
        Self {
            symbol: symbol.into(),
            contract,
            decimals,
        }
    }
}

/// Where the manager currently stands with the local node.
///
/// Only `connect` (and `set_port` through it) transitions this; every query
/// reads it exactly once to pick a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityState {
    /// No usable node; all queries go to the remote explorer.
    Disconnected,
    /// Transport is live but the caller opted out of mainnet verification.
    ConnectedUnverified,
    /// Genesis verified and within the freshness window at last check.
    ConnectedMainnet,
    /// Genesis verified but the node lags the chain tip; treated as
    /// disconnected for routing.
    ConnectedOutOfSync,
}

/// Pure freshness policy: a node is synchronized iff its head is within
/// `tolerance` blocks of the chain tip.
pub fn is_synchronized(current: u64, target: u64, tolerance: u64) -> (bool, String) {
    if current < target.saturating_sub(tolerance) {
        let message = format!(
            "local ethereum node is out of sync: block {current} is more than \
             {tolerance} blocks behind the chain tip at {target}"
        );
        (false, message)
    } else {
        (true, String::new())
    }
}

/// Routes balance queries to a local node or the remote explorer.
pub struct ConnectionManager<C: NodeConnector = HttpConnector> {
    connector: C,
    explorer: ExplorerClient,
    node: Option<C::Node>,
    state: ConnectivityState,
    active_port: Option<u16>,
    last_checked_block: Option<u64>,
    sync_tolerance: u64,
}

impl ConnectionManager<HttpConnector> {
    /// Manager dialing a node on the default local host.
    pub fn over_local_http(explorer: ExplorerClient) -> Self {
        Self::new(HttpConnector::default(), explorer)
    }
}

impl<C: NodeConnector> ConnectionManager<C> {
    /// Build a manager in the `Disconnected` state. No connection attempt is
    /// made until [`connect`](Self::connect) is called.
    pub fn new(connector: C, explorer: ExplorerClient) -> Self {
        Self {
            connector,
            explorer,
            node: None,
            state: ConnectivityState::Disconnected,
            active_port: None,
            last_checked_block: None,
            sync_tolerance: DEFAULT_SYNC_TOLERANCE_BLOCKS,
        }
    }

    /// Override the freshness window (defaults to
    /// [`DEFAULT_SYNC_TOLERANCE_BLOCKS`]).
    pub fn with_sync_tolerance(mut self, blocks: u64) -> Self {
        self.sync_tolerance = blocks;
        self
    }

    pub fn state(&self) -> ConnectivityState {
        self.state
    }

    /// Port of the last successfully validated connection, if any.
    pub fn active_port(&self) -> Option<u16> {
        self.active_port
    }

    /// Node head observed during the last freshness check.
    pub fn last_checked_block(&self) -> Option<u64> {
        self.last_checked_block
    }

    /// Attempt to connect to a local node and decide whether it may answer
    /// queries.
    ///
    /// With `verify_mainnet` the node must present the mainnet genesis hash
    /// and be within the freshness window of the chain tip; without it, a
    /// live transport is accepted as-is. Connectivity problems are expected
    /// and recoverable, so they come back as `(false, message)` rather than
    /// an error: the manager simply keeps routing through the remote
    /// explorer.
    pub async fn connect(&mut self, port: u16, verify_mainnet: bool) -> (bool, String) {
        if self.active_port == Some(port) && self.node_authoritative() {
            return (true, "already connected to an ethereum node".into());
        }

        // Drop any stale handle before dialing, on every path from here on.
        self.node = None;
        self.state = ConnectivityState::Disconnected;
        self.last_checked_block = None;

        let node = match self.connector.open(port).await {
            Ok(node) => node,
            Err(err) => {
                warn!(
                    port,
                    error = %err,
                    "could not connect to a local ethereum node, will use the remote explorer only"
                );
                return (false, format!("failed to connect at port {port}"));
            }
        };

        if !verify_mainnet {
            self.node = Some(node);
            self.state = ConnectivityState::ConnectedUnverified;
            self.active_port = Some(port);
            return (true, String::new());
        }

        let genesis = match node.genesis_hash().await {
            Ok(hash) => hash,
            Err(err) => {
                warn!(port, error = %err, "node did not answer the genesis block request");
                return (false, format!("failed to connect at port {port}"));
            }
        };
        if genesis != MAINNET_GENESIS_HASH {
            warn!(
                port,
                %genesis,
                "connected to a local ethereum node but it is not on the ethereum mainnet"
            );
            return (
                false,
                format!("connected to ethereum node at port {port} but it is not on mainnet"),
            );
        }

        // A mid-sync node reports its own progress; a caught-up node only
        // knows its head, so the chain tip comes from the remote explorer.
        let (current, target) = match node.sync_progress().await {
            Ok(Some(progress)) => (progress.current_block, progress.highest_block),
            Ok(None) => {
                let current = match node.head_block_number().await {
                    Ok(head) => head,
                    Err(err) => {
                        warn!(port, error = %err, "node did not answer the head block request");
                        return (false, format!("failed to connect at port {port}"));
                    }
                };
                let target = match self.explorer.chain_height().await {
                    Ok(height) => height,
                    Err(err) => {
                        warn!(
                            error = %err,
                            "could not determine the chain tip from the remote explorer"
                        );
                        return (false, "could not determine latest block height".into());
                    }
                };
                (current, target)
            }
            Err(err) => {
                warn!(port, error = %err, "node did not answer the sync status request");
                return (false, format!("failed to connect at port {port}"));
            }
        };

        let (synchronized, message) = is_synchronized(current, target, self.sync_tolerance);
        self.last_checked_block = Some(current);
        self.node = Some(node);
        if synchronized {
            self.state = ConnectivityState::ConnectedMainnet;
            self.active_port = Some(port);
            info!(port, current, target, "connected to a mainnet ethereum node");
        } else {
            self.state = ConnectivityState::ConnectedOutOfSync;
            warn!(
                port,
                current, target, "local ethereum node is out of sync, will use the remote explorer only"
            );
        }
        (synchronized, message)
    }

    /// Point the manager at a different port.
    ///
    /// The new port becomes the active port only if the connection validates;
    /// a failed attempt leaves the previous value untouched.
    pub async fn set_port(&mut self, port: u16) -> (bool, String) {
        self.connect(port, true).await
    }

    /// Native balance of one address, in ETH.
    pub async fn get_eth_balance(&self, address: Address) -> Result<BigDecimal, QueryError> {
        let raw = match self.active_node() {
            Some(node) => node.eth_balance(address).await?,
            None => {
                debug!(%address, "querying native balance via the remote explorer");
                self.explorer.eth_balance(address).await?
            }
        };
        Ok(units::from_wei(raw))
    }

    /// Native balances for a set of addresses, in ETH.
    ///
    /// Over the node path each address is queried individually (a local
    /// connection gains nothing from batching); over the remote path the
    /// explorer client batches per its configuration. Either way a single
    /// failure aborts the whole call.
    pub async fn get_multi_eth_balance(
        &self,
        addresses: &[Address],
    ) -> Result<BalanceMap, QueryError> {
        match self.active_node() {
            Some(node) => {
                let mut balances = BalanceMap::new();
                for &address in addresses {
                    let raw = node.eth_balance(address).await?;
                    balances.insert(address, units::from_wei(raw));
                }
                Ok(balances)
            }
            None => {
                debug!(count = addresses.len(), "querying native balances via the remote explorer");
                let raw = self.explorer.multi_eth_balance(addresses).await?;
                Ok(raw
                    .into_iter()
                    .map(|(address, amount)| (address, units::from_wei(amount)))
                    .collect())
            }
        }
    }

    /// Token balances for a set of addresses, normalized by the token's
    /// decimals.
    ///
    /// The result is sparse: only nonzero holders appear. The explorer has
    /// no multi-address token endpoint, so the remote path fans out one
    /// request per address, concurrently, and joins them all; any failure
    /// aborts the call.
    pub async fn get_multi_token_balance(
        &self,
        token: &TokenDescriptor,
        addresses: &[Address],
    ) -> Result<BalanceMap, QueryError> {
        let raw: Vec<(Address, alloy::primitives::U256)> = match self.active_node() {
            Some(node) => {
                let mut fetched = Vec::with_capacity(addresses.len());
                for &holder in addresses {
                    fetched.push((holder, node.token_balance_of(token.contract, holder).await?));
                }
                fetched
            }
            None => {
                debug!(
                    token = %token.symbol,
                    count = addresses.len(),
                    "querying token balances via the remote explorer"
                );
                future::try_join_all(addresses.iter().map(|&holder| async move {
                    let amount = self.explorer.token_balance(token.contract, holder).await?;
                    Ok::<_, QueryError>((holder, amount))
                }))
                .await?
            }
        };

        Ok(raw
            .into_iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(holder, amount)| (holder, units::to_display_units(amount, token.decimals)))
            .collect())
    }

    /// Token balance of a single address.
    ///
    /// Unlike the sparse multi form, an address holding nothing yields
    /// exactly zero, never an error.
    pub async fn get_token_balance(
        &self,
        token: &TokenDescriptor,
        address: Address,
    ) -> Result<BigDecimal, QueryError> {
        let mut balances = self
            .get_multi_token_balance(token, std::slice::from_ref(&address))
            .await?;
        Ok(balances.remove(&address).unwrap_or_else(BigDecimal::zero))
    }

    /// Block header by number, from the node path only.
    ///
    /// There is no remote equivalent, so this is `None` whenever the node is
    /// not authoritative rather than silently falling back elsewhere.
    pub async fn get_block_by_number(
        &self,
        number: u64,
    ) -> Result<Option<BlockInfo>, QueryError> {
        match self.active_node() {
            Some(node) => Ok(node.block_by_number(number).await?),
            None => Ok(None),
        }
    }

    fn node_authoritative(&self) -> bool {
        matches!(
            self.state,
            ConnectivityState::ConnectedMainnet | ConnectivityState::ConnectedUnverified
        )
    }

    /// The node handle, iff the current state lets it answer queries.
    fn active_node(&self) -> Option<&C::Node> {
        if self.node_authoritative() {
            self.node.as_ref()
        } else {
            None
        }
    }
}
