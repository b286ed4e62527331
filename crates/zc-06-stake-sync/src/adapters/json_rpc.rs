//! JSON-RPC chain oracle (`eth_getTransactionReceipt`).

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared_types::{TxHash, WalletAddress};
use tracing::debug;

use crate::domain::receipt::{Log, TxReceipt};
use crate::ports::{ChainOracle, OracleError};

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: &'static str,
    method: String,
    params: T,
    id: u64,
}

impl<T> JsonRpcRequest<T> {
    fn new(method: impl Into<String>, params: T, id: u64) -> Self {
        Self {
            jsonrpc: "2.0",
            method: method.into(),
            params,
            id,
        }
    }
}

/// JSON-RPC response envelope.
#[derive(Debug, Deserialize)]
struct JsonRpcResponse<T> {
    result: Option<T>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RPC Error {}: {}", self.code, self.message)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLog {
    address: String,
    topics: Vec<String>,
    data: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    status: Option<String>,
    to: Option<String>,
    block_number: String,
    logs: Vec<RawLog>,
}

fn invalid(message: impl Into<String>) -> OracleError {
    OracleError::InvalidResponse {
        message: message.into(),
    }
}

fn hex_bytes(value: &str) -> Result<Vec<u8>, OracleError> {
    hex::decode(value.trim_start_matches("0x")).map_err(|e| invalid(format!("bad hex {value}: {e}")))
}

fn hex_u64(value: &str) -> Result<u64, OracleError> {
    u64::from_str_radix(value.trim_start_matches("0x"), 16)
        .map_err(|e| invalid(format!("bad quantity {value}: {e}")))
}

fn address(value: &str) -> Result<WalletAddress, OracleError> {
    WalletAddress::parse(value).map_err(|e| invalid(e.to_string()))
}

impl RawReceipt {
    fn into_receipt(self) -> Result<TxReceipt, OracleError> {
        let logs = self
            .logs
            .into_iter()
            .map(|raw| {
                let topics = raw
                    .topics
                    .iter()
                    .map(|t| {
                        let bytes = hex_bytes(t)?;
                        <[u8; 32]>::try_from(bytes.as_slice())
                            .map_err(|_| invalid(format!("topic {t} is not 32 bytes")))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Log {
                    address: address(&raw.address)?,
                    topics,
                    data: hex_bytes(&raw.data)?,
                })
            })
            .collect::<Result<Vec<_>, OracleError>>()?;

        Ok(TxReceipt {
            tx_hash: TxHash::parse(&self.transaction_hash).map_err(|e| invalid(e.to_string()))?,
            success: self.status.as_deref().map(hex_u64).transpose()? == Some(1),
            to: self.to.as_deref().map(address).transpose()?,
            block_number: hex_u64(&self.block_number)?,
            logs,
        })
    }
}

/// Oracle backed by an Ethereum-compatible JSON-RPC node.
pub struct JsonRpcChainOracle {
    client: Client,
    url: String,
    request_id: AtomicU64,
}

impl JsonRpcChainOracle {
    pub fn new(url: impl Into<String>) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .connect_timeout(Duration::from_secs(3))
            .build()
            .map_err(|e| OracleError::Unavailable {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            url: url.into(),
            request_id: AtomicU64::new(1),
        })
    }

    fn next_id(&self) -> u64 {
        self.request_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Call a method whose `result` may legitimately be `null`.
    async fn call<P, R>(&self, method: &str, params: P) -> Result<Option<R>, OracleError>
    where
        P: Serialize,
        R: serde::de::DeserializeOwned,
    {
        let request = JsonRpcRequest::new(method, params, self.next_id());
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleError::Unavailable {
                message: if e.is_connect() {
                    format!("cannot connect to {}", self.url)
                } else {
                    e.to_string()
                },
            })?;

        let body: JsonRpcResponse<R> = response
            .json()
            .await
            .map_err(|e| invalid(e.to_string()))?;
        if let Some(error) = body.error {
            return Err(OracleError::Unavailable {
                message: error.to_string(),
            });
        }
        Ok(body.result)
    }
}

#[async_trait]
impl ChainOracle for JsonRpcChainOracle {
    async fn transaction_receipt(&self, tx_hash: &TxHash) -> Result<Option<TxReceipt>, OracleError> {
        debug!(tx_hash = %tx_hash, "eth_getTransactionReceipt");
        let raw: Option<RawReceipt> = self
            .call("eth_getTransactionReceipt", [tx_hash.as_str()])
            .await?;
        raw.map(RawReceipt::into_receipt).transpose()
    }
}
