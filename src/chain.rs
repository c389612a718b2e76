//! Latest block of a chain via JSON-RPC `eth_blockNumber`.

use alloy_primitives::{BlockNumber, U64};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;

#[derive(Serialize)]
struct BlockNumberRequest {
    jsonrpc: &'static str,
    method: &'static str,
    params: [(); 0],
    id: u64,
}

impl Default for BlockNumberRequest {
    fn default() -> Self {
        Self {
            jsonrpc: "2.0",
            method: "eth_blockNumber",
            params: [],
            id: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BlockNumberResponse {
    #[serde(default)]
    result: Option<U64>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone)]
pub struct ChainReader {
    client: reqwest::Client,
}

impl ChainReader {
    /// `client` carries the request timeout.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch_latest_block(&self, rpc_url: &Url) -> Result<BlockNumber, FetchError> {
        let response = self
            .client
            .post(rpc_url.clone())
            .json(&BlockNumberRequest::default())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::Transport(format!("HTTP {status}: {body}")));
        }

        let block_number = decode_block_number(&body)?;
        debug!(%rpc_url, block_number, "Fetched latest chain block");
        Ok(block_number)
    }
}

/// Decodes the hex quantity in `result`, or surfaces the JSON-RPC `error`.
pub fn decode_block_number(body: &str) -> Result<BlockNumber, FetchError> {
    let response: BlockNumberResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if let Some(error) = response.error.filter(|e| !e.message.is_empty()) {
        return Err(FetchError::Protocol(format!("RPC error: {}", error.message)));
    }
    response
        .result
        .map(|block| block.to::<BlockNumber>())
        .ok_or_else(|| FetchError::Decode("missing result".to_string()))
}
