// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Conversion from smallest-unit integer amounts to display-unit decimals.
//!
//! Both query paths (local node, remote explorer) report balances as
//! smallest-unit integers; everything the crate returns to callers goes
//! through here first so results are numerically identical regardless of
//! which source answered.

use alloy::primitives::U256;
use bigdecimal::num_bigint::{BigInt, Sign};
use bigdecimal::BigDecimal;

use crate::config::ETH_DECIMALS;

/// Convert a wei amount to ETH.
pub fn from_wei(raw: U256) -> BigDecimal {
    to_display_units(raw, ETH_DECIMALS)
}

/// Scale a smallest-unit amount down by `10^decimals`.
pub fn to_display_units(raw: U256, decimals: u32) -> BigDecimal {
    let digits = BigInt::from_bytes_be(Sign::Plus, &raw.to_be_bytes::<32>());
    BigDecimal::new(digits, i64::from(decimals))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    #[test]
    fn one_eth_from_wei() {
        let one_eth = U256::from(1_000_000_000_000_000_000u64);
        assert_eq!(from_wei(one_eth), dec("1"));
    }

    #[test]
    fn fractional_wei_amounts() {
        let half = U256::from(500_000_000_000_000_000u64);
        assert_eq!(from_wei(half), dec("0.5"));

        // 1 wei is exactly 1e-18 ETH, no rounding
        assert_eq!(from_wei(U256::from(1u64)), dec("0.000000000000000001"));
    }

    #[test]
    fn zero_is_zero() {
        assert_eq!(from_wei(U256::ZERO), dec("0"));
    }

    #[test]
    fn token_decimals_scaling() {
        // 1 USDC-style token with 6 decimals
        assert_eq!(to_display_units(U256::from(1_000_000u64), 6), dec("1"));
        assert_eq!(to_display_units(U256::from(1_234_567u64), 6), dec("1.234567"));
        // 0-decimal tokens pass through unscaled
        assert_eq!(to_display_units(U256::from(42u64), 0), dec("42"));
    }

    #[test]
    fn amounts_beyond_u64() {
        // 10^24 wei = 1,000,000 ETH
        let large = U256::from(10u64).pow(U256::from(24u64));
        assert_eq!(from_wei(large), dec("1000000"));
    }
}
