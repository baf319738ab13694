//! Progress reporting for the training loop
//!
//! The orchestrator emits one [`EpochSnapshot`] per completed epoch to a
//! [`ProgressSink`]. The binary uses [`StdoutDashboard`]; tests use
//! [`NoopSink`].

use std::time::{Duration, Instant};

use crate::metrics::RunStats;

/// Metrics for one completed epoch.
#[derive(Debug, Clone, Copy)]
pub struct EpochSnapshot {
    pub epoch: usize,
    pub total_epochs: usize,
    pub global_step: usize,
    pub total_timesteps: usize,
    /// Steps collected during this epoch
    pub steps_collected: usize,
    pub difficulty: f32,
    pub learning_rate: f64,
}

/// Abstract sink for per-epoch progress reports.
pub trait ProgressSink {
    fn on_epoch(&mut self, snapshot: &EpochSnapshot);
}

/// Sink that discards all reports.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn on_epoch(&mut self, _snapshot: &EpochSnapshot) {
        // intentionally no-op
    }
}

/// Println dashboard with rolling throughput statistics.
pub struct StdoutDashboard {
    stats: RunStats,
    last_epoch_end: Instant,
}

impl StdoutDashboard {
    pub fn new() -> Self {
        Self {
            stats: RunStats::new(20),
            last_epoch_end: Instant::now(),
        }
    }

    fn epoch_duration(&mut self) -> Duration {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_epoch_end);
        self.last_epoch_end = now;
        elapsed
    }
}

impl Default for StdoutDashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for StdoutDashboard {
    fn on_epoch(&mut self, snapshot: &EpochSnapshot) {
        let duration = self.epoch_duration();
        self.stats.record_epoch(
            snapshot.steps_collected,
            duration,
            snapshot.difficulty,
            snapshot.learning_rate,
        );
        println!(
            "[Epoch {}/{}] {}",
            snapshot.epoch,
            snapshot.total_epochs,
            self.stats.format_summary()
        );
    }
}
