//! Check cycle and the fixed-interval loop driving it.

use alloy_primitives::BlockNumber;
use chrono::Local;
use eyre::Result;
use reqwest::Url;
use std::collections::BTreeSet;
use std::time::{Duration, Instant};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::chain::ChainReader;
use crate::error::FetchError;
use crate::registry::Registry;
use crate::report::{section_header, subgraph_row};
use crate::subgraph::SubgraphReader;

/// Where block heights come from.
pub trait BlockSource {
    async fn latest_chain_block(&self, rpc_url: &Url) -> Result<BlockNumber, FetchError>;
    async fn current_subgraph_block(&self, query_url: &Url) -> Result<BlockNumber, FetchError>;
}

/// HTTP-backed [`BlockSource`] sharing one timeout-bound client.
pub struct HttpBlockSource {
    chains: ChainReader,
    subgraphs: SubgraphReader,
}

impl HttpBlockSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            chains: ChainReader::new(client.clone()),
            subgraphs: SubgraphReader::new(client),
        })
    }
}

impl BlockSource for HttpBlockSource {
    async fn latest_chain_block(&self, rpc_url: &Url) -> Result<BlockNumber, FetchError> {
        self.chains.fetch_latest_block(rpc_url).await
    }

    async fn current_subgraph_block(&self, query_url: &Url) -> Result<BlockNumber, FetchError> {
        self.subgraphs.fetch_current_block(query_url).await
    }
}

/// Outcome of one cycle, for logging and tests.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub chains_refreshed: usize,
    pub subgraphs_ok: usize,
    pub subgraphs_failed: usize,
    /// Rendered report sections, in chain id order.
    pub sections: Vec<String>,
}

/// Refresh chain heads, then every subgraph of every chain with a usable head.
pub async fn run_cycle<S: BlockSource>(source: &S, registry: &mut Registry) -> CycleSummary {
    let mut summary = CycleSummary::default();
    let refreshed = refresh_chains(source, registry).await;
    summary.chains_refreshed = refreshed.len();

    for (chain_id, indices) in registry.group_by_chain() {
        let Some(chain) = registry.chains.get(&chain_id) else {
            warn!(chain = %chain_id, "No chain info, skipping its subgraphs");
            continue;
        };
        if !refreshed.contains(&chain_id) || chain.latest_block == 0 {
            info!(
                chain = %chain.name,
                latest_block = chain.latest_block,
                "Skipping subgraphs, chain head unavailable this cycle"
            );
            continue;
        }
        let latest_block = chain.latest_block;
        let mut section = section_header(chain, Local::now());

        for index in indices {
            let subgraph = &mut registry.subgraphs[index];
            match source.current_subgraph_block(&subgraph.url).await {
                Ok(block) => {
                    subgraph.sync.record_sample(block, Instant::now());
                    subgraph.sync.compute_metrics(latest_block);
                    debug!(
                        subgraph = %subgraph.name,
                        block,
                        samples = subgraph.sync.history().len(),
                        sync_speed = subgraph.sync.sync_speed,
                        "Updated sync metrics"
                    );
                    summary.subgraphs_ok += 1;
                }
                Err(err) => {
                    error!(subgraph = %subgraph.name, %err, "Subgraph fetch failed");
                    subgraph.sync.record_failure(latest_block);
                    summary.subgraphs_failed += 1;
                }
            }
            section.push('\n');
            section.push_str(&subgraph_row(subgraph));
        }
        summary.sections.push(section);
    }

    summary
}

/// Returns the ids of chains whose head was fetched this cycle. Failed chains
/// keep their previous value.
async fn refresh_chains<S: BlockSource>(source: &S, registry: &mut Registry) -> BTreeSet<String> {
    let mut refreshed = BTreeSet::new();
    for chain in registry.chains.values_mut() {
        match source.latest_chain_block(&chain.rpc_url).await {
            Ok(block_number) => {
                chain.latest_block = block_number;
                info!(chain = %chain.id, block_number, "Chain latest block");
                refreshed.insert(chain.id.clone());
            }
            Err(err) => {
                error!(chain = %chain.id, %err, "Chain fetch failed");
            }
        }
    }
    refreshed
}

/// Run a cycle now, then every `period` until `shutdown` resolves (or once, if
/// `once`). Shutdown also interrupts a cycle that is still running.
pub async fn run_monitor<S, F>(
    source: &S,
    registry: &mut Registry,
    period: Duration,
    once: bool,
    shutdown: F,
) -> Result<()>
where
    S: BlockSource,
    F: Future,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    loop {
        // First tick completes immediately.
        tokio::select! {
            _ = ticker.tick() => {}
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping");
                return Ok(());
            }
        }

        let summary = tokio::select! {
            summary = run_cycle(source, registry) => summary,
            _ = &mut shutdown => {
                info!("Shutdown signal received during check cycle, stopping");
                return Ok(());
            }
        };
        for section in &summary.sections {
            println!("{section}");
        }
        info!(
            chains_refreshed = summary.chains_refreshed,
            subgraphs_ok = summary.subgraphs_ok,
            subgraphs_failed = summary.subgraphs_failed,
            "Check cycle finished"
        );
        if once {
            return Ok(());
        }
    }
}
