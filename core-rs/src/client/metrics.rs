//! Per-label query accounting
//!
//! The client reports every request to an injected [`QueryMetrics`]. Nothing is
//! global: whoever builds the client owns the counters.

use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;

use super::classify::Connection;

pub trait QueryMetrics: Send + Sync {
    fn record(&self, label: &str, connection: Connection, elapsed: Duration, success: bool);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMetrics;

impl QueryMetrics for NoMetrics {
    fn record(&self, _label: &str, _connection: Connection, _elapsed: Duration, _success: bool) {}
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LabelStats {
    pub calls: u64,
    pub failures: u64,
    pub total: Duration,
}

/// Call counts and cumulative durations keyed by label
#[derive(Debug, Default)]
pub struct SessionMetrics {
    stats: Mutex<BTreeMap<String, LabelStats>>,
}

impl SessionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> BTreeMap<String, LabelStats> {
        self.stats.lock().clone()
    }

    pub fn calls(&self, label: &str) -> u64 {
        self.stats.lock().get(label).map(|s| s.calls).unwrap_or(0)
    }

    pub fn total_calls(&self) -> u64 {
        self.stats.lock().values().map(|s| s.calls).sum()
    }

    pub fn reset(&self) {
        self.stats.lock().clear();
    }
}

impl QueryMetrics for SessionMetrics {
    fn record(&self, label: &str, _connection: Connection, elapsed: Duration, success: bool) {
        let mut stats = self.stats.lock();
        let entry = stats.entry(label.to_string()).or_default();
        entry.calls += 1;
        entry.total += elapsed;
        if !success {
            entry.failures += 1;
        }
    }
}
