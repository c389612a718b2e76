//! In-memory store of chain and subgraph records, owned by the scheduler.

use alloy_primitives::BlockNumber;
use reqwest::Url;
use std::collections::BTreeMap;

use crate::config::{ConfigError, WatchList, parse_url};
use crate::metrics::SyncState;

#[derive(Debug, Clone)]
pub struct Chain {
    pub id: String,
    pub name: String,
    pub rpc_url: Url,
    /// 0 until the first successful fetch.
    pub latest_block: BlockNumber,
}

#[derive(Debug, Clone)]
pub struct Subgraph {
    pub name: String,
    pub url: Url,
    /// Key into [`Registry::chains`]; resolved every cycle.
    pub chain: String,
    pub sync: SyncState,
}

#[derive(Debug, Default)]
pub struct Registry {
    pub chains: BTreeMap<String, Chain>,
    pub subgraphs: Vec<Subgraph>,
}

impl Registry {
    pub fn from_watch_list(list: &WatchList, default_window: usize) -> Result<Self, ConfigError> {
        let chains = list
            .chains
            .iter()
            .map(|(id, cfg)| {
                let chain = Chain {
                    id: id.clone(),
                    name: cfg.name.clone(),
                    rpc_url: parse_url(id, &cfg.rpc_url)?,
                    latest_block: 0,
                };
                Ok((id.clone(), chain))
            })
            .collect::<Result<BTreeMap<_, _>, ConfigError>>()?;

        let subgraphs = list
            .subgraphs
            .iter()
            .map(|cfg| {
                let window = cfg.history_window.unwrap_or(default_window);
                Ok(Subgraph {
                    name: cfg.name.clone(),
                    url: parse_url(&cfg.name, &cfg.url)?,
                    chain: cfg.chain.clone(),
                    sync: SyncState::new(cfg.start_block, window),
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { chains, subgraphs })
    }

    /// Subgraph indices grouped by chain id, in chain id order.
    pub fn group_by_chain(&self) -> BTreeMap<String, Vec<usize>> {
        let mut groups: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (index, subgraph) in self.subgraphs.iter().enumerate() {
            groups.entry(subgraph.chain.clone()).or_default().push(index);
        }
        groups
    }
}
