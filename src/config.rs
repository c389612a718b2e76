//! Watch-list: which chains and subgraphs to poll.

use reqwest::Url;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid watch-list JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid URL for {owner}: {source}")]
    InvalidUrl {
        owner: String,
        source: url::ParseError,
    },
    #[error("history window of subgraph {0} must be at least 1")]
    ZeroWindow(String),
    #[error("watch-list has no subgraphs")]
    Empty,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    pub rpc_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubgraphConfig {
    pub name: String,
    pub url: String,
    pub chain: String,
    #[serde(default)]
    pub start_block: u64,
    /// Falls back to the CLI default when absent.
    pub history_window: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchList {
    pub chains: BTreeMap<String, ChainConfig>,
    pub subgraphs: Vec<SubgraphConfig>,
}

impl WatchList {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let list: Self = serde_json::from_str(&raw)?;
        list.validate()?;
        Ok(list)
    }

    /// PulseChain exchange subgraph, watched when no file is given.
    pub fn builtin() -> Self {
        let mut chains = BTreeMap::new();
        chains.insert(
            "pulsechain".to_string(),
            ChainConfig {
                name: "PulseChain".to_string(),
                rpc_url: "https://rpc.pulsechain.com".to_string(),
            },
        );
        Self {
            chains,
            subgraphs: vec![SubgraphConfig {
                name: "pDEX PulseChain Exchange 1".to_string(),
                url: "https://graph.pulsechain.com/subgraphs/name/pulsechain/pulsex".to_string(),
                chain: "pulsechain".to_string(),
                start_block: 23_287_990,
                history_window: None,
            }],
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subgraphs.is_empty() {
            return Err(ConfigError::Empty);
        }
        for (id, chain) in &self.chains {
            parse_url(id, &chain.rpc_url)?;
        }
        for subgraph in &self.subgraphs {
            parse_url(&subgraph.name, &subgraph.url)?;
            if subgraph.history_window == Some(0) {
                return Err(ConfigError::ZeroWindow(subgraph.name.clone()));
            }
        }
        Ok(())
    }
}

pub fn parse_url(owner: &str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
        owner: owner.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn builtin_watch_list_is_valid() {
        let list = WatchList::builtin();
        list.validate().unwrap();
        assert!(list.chains.contains_key("pulsechain"));
        assert_eq!(list.subgraphs[0].start_block, 23_287_990);
    }

    #[test]
    fn loads_watch_list_from_file() {
        let file = write_config(
            r#"{
                "chains": {
                    "mainnet": { "name": "Ethereum", "rpc_url": "http://localhost:8545" }
                },
                "subgraphs": [
                    { "name": "uniswap", "url": "http://localhost:8000/subgraphs/name/uni", "chain": "mainnet", "start_block": 12369621, "history_window": 3 },
                    { "name": "blocks", "url": "http://localhost:8000/subgraphs/name/blocks", "chain": "mainnet" }
                ]
            }"#,
        );
        let list = WatchList::from_file(file.path()).unwrap();
        assert_eq!(list.chains["mainnet"].name, "Ethereum");
        assert_eq!(list.subgraphs[0].history_window, Some(3));
        assert_eq!(list.subgraphs[1].start_block, 0);
        assert_eq!(list.subgraphs[1].history_window, None);
    }

    #[test]
    fn rejects_zero_window() {
        let file = write_config(
            r#"{
                "chains": {},
                "subgraphs": [
                    { "name": "bad", "url": "http://localhost:8000", "chain": "x", "history_window": 0 }
                ]
            }"#,
        );
        let err = WatchList::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ZeroWindow(name) if name == "bad"));
    }

    #[test]
    fn rejects_invalid_url() {
        let file = write_config(
            r#"{
                "chains": { "c": { "name": "C", "rpc_url": "not a url" } },
                "subgraphs": [ { "name": "s", "url": "http://localhost:8000", "chain": "c" } ]
            }"#,
        );
        let err = WatchList::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { owner, .. } if owner == "c"));
    }

    #[test]
    fn rejects_empty_and_malformed_files() {
        let empty = write_config(r#"{ "chains": {}, "subgraphs": [] }"#);
        assert!(matches!(
            WatchList::from_file(empty.path()),
            Err(ConfigError::Empty)
        ));

        let malformed = write_config("{ chains");
        assert!(matches!(
            WatchList::from_file(malformed.path()),
            Err(ConfigError::Parse(_))
        ));

        let missing = WatchList::from_file(Path::new("/nonexistent/watch.json"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
