//! Indexed block of a subgraph via the GraphQL `_meta` field.

use alloy_primitives::BlockNumber;
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FetchError;

pub const META_BLOCK_QUERY: &str = "{_meta{block{number}}}";

#[derive(Serialize)]
struct GraphQlRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<MetaData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct MetaData {
    #[serde(rename = "_meta")]
    meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
struct Meta {
    block: Option<MetaBlock>,
}

#[derive(Debug, Deserialize)]
struct MetaBlock {
    number: i64,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Clone)]
pub struct SubgraphReader {
    client: reqwest::Client,
}

impl SubgraphReader {
    /// `client` carries the request timeout and the `User-Agent`.
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn fetch_current_block(&self, query_url: &Url) -> Result<BlockNumber, FetchError> {
        let response = self
            .client
            .post(query_url.clone())
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .json(&GraphQlRequest {
                query: META_BLOCK_QUERY,
            })
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FetchError::HttpStatus { status, body });
        }

        let block_number = decode_meta_block(&body)?;
        debug!(%query_url, block_number, "Fetched subgraph block");
        Ok(block_number)
    }
}

/// Extracts `data._meta.block.number` from a GraphQL response body.
pub fn decode_meta_block(body: &str) -> Result<BlockNumber, FetchError> {
    let response: GraphQlResponse =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    if let Some(first) = response.errors.first() {
        return Err(FetchError::Protocol(format!(
            "GraphQL error: {}",
            first.message
        )));
    }

    let number = response
        .data
        .and_then(|data| data.meta)
        .and_then(|meta| meta.block)
        .map(|block| block.number)
        .unwrap_or_default();
    if number <= 0 {
        return Err(FetchError::Protocol(format!(
            "invalid block number: {number}"
        )));
    }
    Ok(number as BlockNumber)
}
