mod chain;
mod cli;
mod config;
mod error;
mod metrics;
mod monitor;
mod registry;
mod report;
mod subgraph;
#[cfg(test)]
mod test_utils;

use clap::Parser;
use eyre::Result;
use tracing::info;

use crate::cli::Args;
use crate::config::WatchList;
use crate::monitor::{HttpBlockSource, run_monitor};
use crate::registry::Registry;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; stdout is reserved for the report tables
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("subgraph_sync_monitor=info".parse()?),
        )
        .init();

    let args = Args::parse();

    info!("Starting subgraph-sync-monitor");
    info!("Check interval: {:?}", args.interval());
    info!("Request timeout: {:?}", args.timeout());

    let watch_list = match &args.config {
        Some(path) => {
            info!("Watch-list: {:?}", path);
            WatchList::from_file(path)?
        }
        None => {
            info!("Watch-list: built-in");
            WatchList::builtin()
        }
    };

    let mut registry = Registry::from_watch_list(&watch_list, args.history_window)?;
    for subgraph in &registry.subgraphs {
        info!(
            subgraph = %subgraph.name,
            chain = %subgraph.chain,
            start_block = subgraph.sync.start_block,
            history_window = subgraph.sync.history().capacity(),
            "Watching subgraph"
        );
    }

    let source = HttpBlockSource::new(args.timeout())?;
    run_monitor(
        &source,
        &mut registry,
        args.interval(),
        args.once,
        tokio::signal::ctrl_c(),
    )
    .await
}
