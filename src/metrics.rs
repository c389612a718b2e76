//! Rolling sync history and the metrics derived from it.
//!
//! Speed is taken from the oldest and newest sample of a bounded window, so the
//! window size is the only knob between smoothing and responsiveness.

use alloy_primitives::BlockNumber;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Default number of samples kept per subgraph.
pub const DEFAULT_HISTORY_WINDOW: usize = 6;

/// One observation of a subgraph's indexed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    pub block: BlockNumber,
    pub observed_at: Instant,
}

/// FIFO window holding the most recent `capacity` samples.
#[derive(Debug, Clone)]
pub struct History {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl History {
    /// A zero capacity is bumped to one so the newest sample is always retained.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.samples.front()
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Blocks per minute between the oldest and newest sample, if the window
    /// spans a positive amount of time.
    pub fn speed_per_minute(&self) -> Option<f64> {
        if self.samples.len() < 2 {
            return None;
        }
        let (first, last) = (self.oldest()?, self.newest()?);
        let minutes = last
            .observed_at
            .saturating_duration_since(first.observed_at)
            .as_secs_f64()
            / 60.0;
        if minutes <= 0.0 {
            return None;
        }
        let block_diff = last.block as f64 - first.block as f64;
        Some(block_diff / minutes)
    }
}

/// Per-subgraph sync state, mutated in place every cycle.
#[derive(Debug, Clone)]
pub struct SyncState {
    pub start_block: BlockNumber,
    /// `None` when the last fetch failed or nothing was fetched yet.
    pub current_block: Option<BlockNumber>,
    pub last_chain_block: BlockNumber,
    /// Signed: a subgraph read shortly after the chain head can be ahead of it.
    pub blocks_behind: i64,
    pub sync_speed: f64,
    pub eta: Duration,
    history: History,
}

impl SyncState {
    pub fn new(start_block: BlockNumber, history_window: usize) -> Self {
        Self {
            start_block,
            current_block: None,
            last_chain_block: 0,
            blocks_behind: 0,
            sync_speed: 0.0,
            eta: Duration::ZERO,
            history: History::new(history_window),
        }
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Appends a successful observation and makes it the current block.
    pub fn record_sample(&mut self, block: BlockNumber, now: Instant) {
        self.history.push(Sample {
            block,
            observed_at: now,
        });
        self.current_block = self.history.newest().map(|sample| sample.block);
    }

    /// Refreshes lag, speed and ETA against the chain head.
    ///
    /// Speed and ETA keep their previous values when the window is too small,
    /// spans no time, or (for the ETA) the speed is not positive.
    pub fn compute_metrics(&mut self, latest_chain_block: BlockNumber) {
        self.last_chain_block = latest_chain_block;
        let current = self.current_block.unwrap_or_default();
        self.blocks_behind = signed_diff(latest_chain_block, current);

        let Some(speed) = self.history.speed_per_minute() else {
            return;
        };
        self.sync_speed = speed;
        if speed > 0.0 {
            // Ahead of the head: nothing left to index.
            let minutes = (self.blocks_behind as f64 / speed).max(0.0);
            self.eta = Duration::try_from_secs_f64(minutes * 60.0).unwrap_or(Duration::MAX);
        }
    }

    /// Degrades the row after a failed fetch. History is left as is.
    pub fn record_failure(&mut self, latest_chain_block: BlockNumber) {
        self.current_block = None;
        self.last_chain_block = latest_chain_block;
        self.blocks_behind = signed_diff(latest_chain_block, self.start_block);
        self.sync_speed = 0.0;
        self.eta = Duration::ZERO;
    }

    /// Share of the backlog between `start_block` and the chain head already indexed.
    pub fn progress_percentage(&self) -> f64 {
        let Some(current) = self.current_block else {
            return 0.0;
        };
        if self.start_block == 0 || self.last_chain_block <= self.start_block {
            return 0.0;
        }
        let done = current as f64 - self.start_block as f64;
        let total = (self.last_chain_block - self.start_block) as f64;
        done / total * 100.0
    }
}

fn signed_diff(a: BlockNumber, b: BlockNumber) -> i64 {
    (a as i128 - b as i128).clamp(i64::MIN as i128, i64::MAX as i128) as i64
}
