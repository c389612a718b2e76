use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::metrics::DEFAULT_HISTORY_WINDOW;

#[derive(Parser, Debug)]
#[command(name = "subgraph-sync-monitor")]
#[command(about = "Reports subgraph indexing lag and time-to-sync against chain heads")]
pub struct Args {
    /// JSON watch-list of chains and subgraphs; the built-in PulseChain list is used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Seconds between check cycles
    #[arg(long, default_value_t = 600, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    /// Per-request HTTP timeout in seconds
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_secs: u64,

    /// Samples kept per subgraph when the watch-list does not set one
    #[arg(long, default_value_t = DEFAULT_HISTORY_WINDOW, value_parser = parse_window)]
    pub history_window: usize,

    /// Run a single check cycle and exit
    #[arg(long)]
    pub once: bool,
}

impl Args {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_window(raw: &str) -> Result<usize, String> {
    match raw.parse::<usize>() {
        Ok(0) => Err("history window must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
