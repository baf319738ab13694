//! Rolling run statistics for the training dashboard
//!
//! Tracks per-epoch throughput, difficulty, and learning rate over a rolling
//! window so the dashboard shows smoothed recent values rather than noisy
//! single-epoch numbers.

use std::collections::VecDeque;
use std::time::Duration;

/// Rolling-window statistics over completed epochs.
///
/// # Example
///
/// ```rust
/// use ml_flappy::metrics::RunStats;
/// use std::time::Duration;
///
/// let mut stats = RunStats::new(10);
/// stats.record_epoch(8192, Duration::from_secs(2), 0.25, 3e-4);
///
/// assert_eq!(stats.total_steps(), 8192);
/// assert!((stats.mean_sps() - 4096.0).abs() < 1e-3);
/// ```
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Steps collected per epoch (rolling window)
    epoch_steps: VecDeque<usize>,

    /// Wall-clock duration per epoch (rolling window)
    epoch_durations: VecDeque<Duration>,

    /// Difficulty per epoch (rolling window)
    difficulties: VecDeque<f32>,

    /// Learning rate per epoch (rolling window)
    learning_rates: VecDeque<f64>,

    /// Total epochs completed
    total_epochs: usize,

    /// Total steps collected
    total_steps: usize,

    /// Window size for rolling averages
    window_size: usize,
}

impl RunStats {
    /// Create a tracker keeping the last `window_size` epochs.
    pub fn new(window_size: usize) -> Self {
        Self {
            epoch_steps: VecDeque::with_capacity(window_size),
            epoch_durations: VecDeque::with_capacity(window_size),
            difficulties: VecDeque::with_capacity(window_size),
            learning_rates: VecDeque::with_capacity(window_size),
            total_epochs: 0,
            total_steps: 0,
            window_size,
        }
    }

    /// Record one completed epoch.
    pub fn record_epoch(
        &mut self,
        steps: usize,
        duration: Duration,
        difficulty: f32,
        learning_rate: f64,
    ) {
        Self::push_deque(&mut self.epoch_steps, steps, self.window_size);
        Self::push_deque(&mut self.epoch_durations, duration, self.window_size);
        Self::push_deque(&mut self.difficulties, difficulty, self.window_size);
        Self::push_deque(&mut self.learning_rates, learning_rate, self.window_size);
        self.total_epochs += 1;
        self.total_steps += steps;
    }

    /// Mean environment steps per second over the window.
    pub fn mean_sps(&self) -> f64 {
        let steps: usize = self.epoch_steps.iter().sum();
        let seconds: f64 = self.epoch_durations.iter().map(Duration::as_secs_f64).sum();
        if seconds <= 0.0 {
            0.0
        } else {
            steps as f64 / seconds
        }
    }

    /// Most recently recorded difficulty.
    pub fn last_difficulty(&self) -> f32 {
        self.difficulties.back().copied().unwrap_or(0.0)
    }

    /// Most recently recorded learning rate.
    pub fn last_learning_rate(&self) -> f64 {
        self.learning_rates.back().copied().unwrap_or(0.0)
    }

    /// Total epochs recorded.
    pub fn total_epochs(&self) -> usize {
        self.total_epochs
    }

    /// Total steps recorded.
    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// One-line summary for the dashboard.
    pub fn format_summary(&self) -> String {
        format!(
            "Steps: {} | SPS: {:.0} | Difficulty: {:.3} | LR: {:.2e}",
            self.total_steps,
            self.mean_sps(),
            self.last_difficulty(),
            self.last_learning_rate(),
        )
    }

    fn push_deque<T>(deque: &mut VecDeque<T>, value: T, window_size: usize) {
        if deque.len() >= window_size {
            deque.pop_front();
        }
        deque.push_back(value);
    }
}
