//! Manual learning-rate annealing
//!
//! Linear interpolation from an initial to a final learning rate over the
//! course of a run, applied by overwriting the learning-rate field of every
//! optimizer parameter group before each optimization phase.
//!
//! Only variants that opt into manual scheduling use this; variants that
//! delegate annealing to the external trainer must not also apply it.
//! Run-plan validation rejects that combination.

use serde::{Deserialize, Serialize};

use super::trainer::ParamGroup;

/// Linear learning-rate schedule over a run's progress fraction.
///
/// The derived rate is a pure function of the progress fraction, so
/// applying the schedule twice at the same point produces the same rate
/// with no cumulative drift.
///
/// # Example
///
/// ```rust
/// use ml_flappy::rl::LinearLrSchedule;
///
/// let schedule = LinearLrSchedule::new(0.01, 0.01 / 6.0);
/// assert_eq!(schedule.effective_lr(0.0), 0.01);
/// assert_eq!(schedule.effective_lr(1.0), 0.01 / 6.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearLrSchedule {
    /// Learning rate at progress 0
    pub initial_lr: f64,

    /// Learning rate at progress 1
    pub final_lr: f64,
}

impl LinearLrSchedule {
    /// Create a schedule decaying from `initial_lr` to `final_lr`.
    pub fn new(initial_lr: f64, final_lr: f64) -> Self {
        Self {
            initial_lr,
            final_lr,
        }
    }

    /// Validate the schedule bounds.
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_lr <= 0.0 || self.final_lr <= 0.0 {
            return Err(format!(
                "learning rates must be positive, got initial {} final {}",
                self.initial_lr, self.final_lr
            ));
        }
        if self.final_lr > self.initial_lr {
            return Err(format!(
                "final_lr ({}) cannot exceed initial_lr ({})",
                self.final_lr, self.initial_lr
            ));
        }
        Ok(())
    }

    /// Learning rate at the given progress fraction.
    ///
    /// The fraction is clamped to `[0, 1]`: once a run passes its total
    /// timestep budget the rate stays at `final_lr`.
    pub fn effective_lr(&self, progress_fraction: f64) -> f64 {
        let fraction = progress_fraction.clamp(0.0, 1.0);
        // Weighted form rather than initial + (final - initial) * fraction:
        // both endpoints must be exact, and the difference form rounds at
        // fraction 1.0.
        self.initial_lr * (1.0 - fraction) + self.final_lr * fraction
    }

    /// Overwrite the learning rate of every parameter group.
    pub fn apply(&self, progress_fraction: f64, param_groups: &mut [ParamGroup]) {
        let lr = self.effective_lr(progress_fraction);
        for group in param_groups {
            group.learning_rate = lr;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_exact() {
        let schedule = LinearLrSchedule::new(3e-4, 5e-5);
        assert_eq!(schedule.effective_lr(0.0), 3e-4);
        assert_eq!(schedule.effective_lr(1.0), 5e-5);

        // Bit-exact at both ends for awkward mantissas too.
        for (initial, final_lr) in [(0.01, 0.01 / 6.0), (0.015, 1e-7), (3e-4, 3e-4)] {
            let schedule = LinearLrSchedule::new(initial, final_lr);
            assert_eq!(schedule.effective_lr(0.0), initial);
            assert_eq!(schedule.effective_lr(1.0), final_lr);
        }
    }

    #[test]
    fn test_halfway_interpolation() {
        // The flappyv2 launch: final rate is a sixth of the initial.
        let initial = 0.01;
        let schedule = LinearLrSchedule::new(initial, initial / 6.0);
        let expected = initial * 0.5 + (initial / 6.0) * 0.5;
        assert!((schedule.effective_lr(0.5) - expected).abs() < 1e-15);
    }

    #[test]
    fn test_monotonically_decreasing() {
        let schedule = LinearLrSchedule::new(1e-2, 1e-3);
        let mut previous = schedule.effective_lr(0.0);
        for i in 1..=100 {
            let current = schedule.effective_lr(i as f64 / 100.0);
            assert!(current <= previous);
            previous = current;
        }
    }

    #[test]
    fn test_idempotent() {
        let schedule = LinearLrSchedule::new(3e-4, 5e-5);
        let first = schedule.effective_lr(0.37);
        let second = schedule.effective_lr(0.37);
        assert_eq!(first, second);

        let mut groups = vec![ParamGroup { learning_rate: 0.0 }];
        schedule.apply(0.37, &mut groups);
        let after_first = groups[0].learning_rate;
        schedule.apply(0.37, &mut groups);
        assert_eq!(groups[0].learning_rate, after_first);
    }

    #[test]
    fn test_clamps_past_the_end() {
        let schedule = LinearLrSchedule::new(3e-4, 5e-5);
        assert_eq!(schedule.effective_lr(1.5), 5e-5);
        assert_eq!(schedule.effective_lr(-0.5), 3e-4);
    }

    #[test]
    fn test_applies_to_all_param_groups() {
        let schedule = LinearLrSchedule::new(1e-2, 1e-3);
        let mut groups = vec![
            ParamGroup { learning_rate: 1e-2 },
            ParamGroup { learning_rate: 1e-2 },
            ParamGroup { learning_rate: 1e-2 },
        ];
        schedule.apply(1.0, &mut groups);
        for group in &groups {
            assert_eq!(group.learning_rate, 1e-3);
        }
    }

    #[test]
    fn test_validation() {
        assert!(LinearLrSchedule::new(3e-4, 5e-5).validate().is_ok());
        assert!(LinearLrSchedule::new(3e-4, 3e-4).validate().is_ok());
        assert!(LinearLrSchedule::new(-1.0, 5e-5).validate().is_err());
        assert!(LinearLrSchedule::new(5e-5, 3e-4).validate().is_err());
    }
}
