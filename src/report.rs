//! Plain-text status tables, one section per chain.

use chrono::{DateTime, Local};
use std::fmt::Write;
use std::time::Duration;

use crate::metrics::SyncState;
use crate::registry::{Chain, Subgraph};

const HOUR: Duration = Duration::from_secs(60 * 60);
const DAY: Duration = Duration::from_secs(24 * 60 * 60);

pub fn section_header(chain: &Chain, now: DateTime<Local>) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n--- {} Subgraph Sync Status (Latest Block: {}) - {} ---",
        chain.name,
        chain.latest_block,
        now.format("%Y-%m-%d %H:%M:%S")
    );
    let _ = write!(
        out,
        "{:<25} {:<12} {:<12} {:<12} {:<15} {:<15} {}",
        "Subgraph", "ChainBlock", "Subgraph", "Behind", "Sync Speed", "ETA", "Progress"
    );
    out
}

pub fn subgraph_row(subgraph: &Subgraph) -> String {
    let sync = &subgraph.sync;
    format!(
        "{:<25} {:<12} {:<12} {:<12} {:<15.2} {:<15} {:.2}%",
        subgraph.name,
        sync.last_chain_block,
        format_current_block(sync),
        sync.blocks_behind,
        sync.sync_speed,
        format_eta(sync),
        sync.progress_percentage()
    )
}

pub fn format_current_block(sync: &SyncState) -> String {
    match sync.current_block {
        Some(block) => block.to_string(),
        None => "Error".to_string(),
    }
}

pub fn format_eta(sync: &SyncState) -> String {
    if sync.current_block.is_none() {
        return "Error".to_string();
    }
    let eta = sync.eta;
    if eta.is_zero() {
        return if sync.blocks_behind == 0 {
            "In sync".to_string()
        } else {
            "Unknown".to_string()
        };
    }
    if eta >= DAY {
        format!("{:.1}d", eta.as_secs_f64() / DAY.as_secs_f64())
    } else if eta >= HOUR {
        format!("{:.1}h", eta.as_secs_f64() / HOUR.as_secs_f64())
    } else {
        format!("{:.0}m", eta.as_secs_f64() / 60.0)
    }
}
