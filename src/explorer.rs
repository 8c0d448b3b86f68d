// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Remote block-explorer client.
//!
//! This is the fallback balance source used whenever no verified, in-sync
//! local node is available. Balances come from an etherscan-compatible
//! account API; the chain tip height comes from a blockcypher-style chain
//! endpoint. Every response carries an explicit status: a non-success status
//! is always an error, never an empty or zero result.

use std::collections::HashMap;

use alloy::primitives::{Address, U256};
use futures::future;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::config::{
    DEFAULT_CHAIN_HEIGHT_URL, DEFAULT_EXPLORER_API_URL, DEFAULT_MULTI_BATCH_SIZE,
    DEFAULT_MULTI_BATCH_THRESHOLD,
};
use crate::error::ConfigError;

/// Remote explorer endpoints and batching policy.
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Etherscan-compatible account API endpoint.
    pub api_url: Url,
    /// Chain endpoint reporting the current tip height.
    pub chain_height_url: Url,
    /// Optional API key appended to every account query.
    pub api_key: Option<String>,
    /// Address count above which multi-balance queries are split.
    pub multi_batch_threshold: usize,
    /// Group size for split multi-balance queries.
    pub multi_batch_size: usize,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_EXPLORER_API_URL).expect("default explorer URL is valid"),
            chain_height_url: Url::parse(DEFAULT_CHAIN_HEIGHT_URL)
                .expect("default chain height URL is valid"),
            api_key: None,
            multi_batch_threshold: DEFAULT_MULTI_BATCH_THRESHOLD,
            multi_batch_size: DEFAULT_MULTI_BATCH_SIZE,
        }
    }
}

impl ExplorerConfig {
    /// Build a config pointing at custom endpoints, keeping default batching.
    pub fn with_endpoints(api_url: &str, chain_height_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_url: Url::parse(api_url).map_err(|e| ConfigError::InvalidUrl(e.to_string()))?,
            chain_height_url: Url::parse(chain_height_url)
                .map_err(|e| ConfigError::InvalidUrl(e.to_string()))?,
            ..Self::default()
        })
    }
}

/// Envelope shared by all etherscan-compatible account responses.
///
/// `result` stays untyped until the status flag has been checked: error
/// responses reuse the field for a human-readable reason.
#[derive(Deserialize)]
struct ApiEnvelope {
    status: String,
    #[serde(default)]
    message: String,
    result: serde_json::Value,
}

#[derive(Deserialize)]
struct MultiBalanceEntry {
    account: String,
    balance: String,
}

#[derive(Deserialize)]
struct ChainSummary {
    height: u64,
}

/// HTTP client for the remote explorer APIs.
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    config: ExplorerConfig,
    client: reqwest::Client,
}

impl ExplorerClient {
    pub fn new(config: ExplorerConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    /// Native balance of a single address, in wei.
    pub async fn eth_balance(&self, address: Address) -> Result<U256, ExplorerError> {
        let raw: String = self
            .account_query(
                "balance",
                &[("address", format!("{address:#x}")), ("tag", "latest".into())],
            )
            .await?;
        parse_amount(&raw)
    }

    /// Native balances for a set of addresses, in wei.
    ///
    /// Inputs larger than the batching threshold are split into fixed-size
    /// groups, one multi-balance request per group. Groups are issued
    /// concurrently and all joined; any failing group aborts the whole call,
    /// so a partial mapping is never returned.
    pub async fn multi_eth_balance(
        &self,
        addresses: &[Address],
    ) -> Result<HashMap<Address, U256>, ExplorerError> {
        if addresses.is_empty() {
            return Ok(HashMap::new());
        }

        let group_size = self.config.multi_batch_size.max(1);
        let groups: Vec<&[Address]> = if addresses.len() > self.config.multi_batch_threshold {
            addresses.chunks(group_size).collect()
        } else {
            vec![addresses]
        };

        let fetched =
            future::try_join_all(groups.into_iter().map(|group| self.balance_group(group))).await?;

        let mut balances = HashMap::new();
        for group in fetched {
            balances.extend(group);
        }
        Ok(balances)
    }

    /// ERC-20 balance of one holder, in the token's smallest unit.
    ///
    /// The explorer has no multi-address token endpoint, so token fan-out is
    /// one request per holder (see the connection manager).
    pub async fn token_balance(
        &self,
        contract: Address,
        holder: Address,
    ) -> Result<U256, ExplorerError> {
        let raw: String = self
            .account_query(
                "tokenbalance",
                &[
                    ("contractaddress", format!("{contract:#x}")),
                    ("address", format!("{holder:#x}")),
                    ("tag", "latest".into()),
                ],
            )
            .await?;
        parse_amount(&raw)
    }

    /// Current chain tip height as reported by the chain endpoint.
    pub async fn chain_height(&self) -> Result<u64, ExplorerError> {
        let value: serde_json::Value = self
            .client
            .get(self.config.chain_height_url.clone())
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        let summary: ChainSummary = serde_json::from_value(value)
            .map_err(|e| ExplorerError::MalformedResponse(format!("chain height: {e}")))?;
        Ok(summary.height)
    }

    async fn balance_group(
        &self,
        group: &[Address],
    ) -> Result<Vec<(Address, U256)>, ExplorerError> {
        let joined = group
            .iter()
            .map(|a| format!("{a:#x}"))
            .collect::<Vec<_>>()
            .join(",");
        let entries: Vec<MultiBalanceEntry> = self
            .account_query("balancemulti", &[("address", joined), ("tag", "latest".into())])
            .await?;

        entries
            .into_iter()
            .map(|entry| {
                let account = entry.account.parse::<Address>().map_err(|e| {
                    ExplorerError::MalformedResponse(format!(
                        "account {}: {e}",
                        entry.account
                    ))
                })?;
                Ok((account, parse_amount(&entry.balance)?))
            })
            .collect()
    }

    /// Issue one `module=account` query and unwrap the response envelope.
    async fn account_query<T: DeserializeOwned>(
        &self,
        action: &str,
        params: &[(&str, String)],
    ) -> Result<T, ExplorerError> {
        let mut query: Vec<(&str, String)> =
            vec![("module", "account".into()), ("action", action.into())];
        query.extend(params.iter().cloned());
        if let Some(key) = &self.config.api_key {
            query.push(("apikey", key.clone()));
        }

        let envelope: ApiEnvelope = self
            .client
            .get(self.config.api_url.clone())
            .query(&query)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if envelope.status != "1" {
            return Err(ExplorerError::Status(format!(
                "{action} failed: {} ({})",
                envelope.message, envelope.result
            )));
        }

        serde_json::from_value(envelope.result)
            .map_err(|e| ExplorerError::MalformedResponse(format!("{action} result: {e}")))
    }
}

fn parse_amount(raw: &str) -> Result<U256, ExplorerError> {
    raw.trim()
        .parse::<U256>()
        .map_err(|e| ExplorerError::MalformedResponse(format!("amount {raw:?}: {e}")))
}

/// Errors from the remote explorer path.
///
/// None of these are ever coerced into a zero or empty balance; silently
/// misreporting holdings is worse than failing the query.
#[derive(Debug, thiserror::Error)]
pub enum ExplorerError {
    #[error("explorer request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("explorer returned error status: {0}")]
    Status(String),

    #[error("malformed explorer response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ExplorerClient {
        let config = ExplorerConfig::with_endpoints(
            &format!("{}/api", server.uri()),
            &format!("{}/v1/eth/main", server.uri()),
        )
        .unwrap();
        ExplorerClient::new(config)
    }

    fn addr(n: u8) -> Address {
        Address::with_last_byte(n)
    }

    #[tokio::test]
    async fn eth_balance_parses_wei_amount() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("action", "balance"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status":"1","message":"OK","result":"1500000000000000000"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let balance = client_for(&server).await.eth_balance(addr(1)).await.unwrap();
        assert_eq!(balance, U256::from(1_500_000_000_000_000_000u64));
    }

    #[tokio::test]
    async fn error_status_is_a_hard_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status":"0","message":"NOTOK","result":"Max rate limit reached"}"#,
            ))
            .mount(&server)
            .await;

        let err = client_for(&server).await.eth_balance(addr(1)).await.unwrap_err();
        assert!(matches!(err, ExplorerError::Status(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn small_multi_query_is_a_single_request() {
        let server = MockServer::start().await;
        let body = format!(
            r#"{{"status":"1","message":"OK","result":[
                {{"account":"{:#x}","balance":"10"}},
                {{"account":"{:#x}","balance":"20"}}
            ]}}"#,
            addr(1),
            addr(2)
        );
        Mock::given(method("GET"))
            .and(path("/api"))
            .and(query_param("action", "balancemulti"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(1)
            .mount(&server)
            .await;

        let balances = client_for(&server)
            .await
            .multi_eth_balance(&[addr(1), addr(2)])
            .await
            .unwrap();
        assert_eq!(balances.len(), 2);
        assert_eq!(balances[&addr(1)], U256::from(10u64));
        assert_eq!(balances[&addr(2)], U256::from(20u64));
    }

    #[tokio::test]
    async fn chain_height_reads_height_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/eth/main"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"name":"ETH.main","height":18000000}"#),
            )
            .mount(&server)
            .await;

        let height = client_for(&server).await.chain_height().await.unwrap();
        assert_eq!(height, 18_000_000);
    }

    #[tokio::test]
    async fn chain_height_without_field_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/eth/main"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"name":"ETH.main"}"#))
            .mount(&server)
            .await;

        let err = client_for(&server).await.chain_height().await.unwrap_err();
        assert!(matches!(err, ExplorerError::MalformedResponse(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn non_numeric_balance_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"status":"1","message":"OK","result":"not-a-number"}"#,
            ))
            .mount(&server)
            .await;

        let err = client_for(&server).await.eth_balance(addr(1)).await.unwrap_err();
        assert!(matches!(err, ExplorerError::MalformedResponse(_)), "got {err:?}");
    }
}
