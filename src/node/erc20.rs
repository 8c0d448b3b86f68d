// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! ERC-20 token contract interface.
//!
//! Only the read-side entry points balance queries need. The interface is
//! resolved at compile time by the `sol!` macro, so there is no runtime ABI
//! file to load or fail on.

use alloy::{
    primitives::{Address, U256},
    providers::Provider,
    sol,
};

use super::connection::NodeError;

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function symbol() external view returns (string);
        function decimals() external view returns (uint8);
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Call `balanceOf(holder)` on the token contract, returning the raw
/// smallest-unit amount.
pub(crate) async fn balance_of<P: Provider + Clone>(
    provider: &P,
    token: Address,
    holder: Address,
) -> Result<U256, NodeError> {
    let contract = IERC20::new(token, provider.clone());
    contract
        .balanceOf(holder)
        .call()
        .await
        .map_err(|e| NodeError::Contract(e.to_string()))
}
