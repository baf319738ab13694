//! Curriculum difficulty schedule
//!
//! Maps training progress to a normalized task difficulty. The schedule is
//! a pure function of its inputs so that resuming a run from a saved
//! `global_step` reproduces the same difficulty trajectory.

/// Compute the curriculum difficulty for the current training progress.
///
/// Returns a value in `[0.0, 1.0]` that grows linearly with `global_step`
/// and saturates at `1.0` once `global_step >= total_timesteps`. A run with
/// `total_timesteps == 0` is treated as already complete and gets `1.0`.
///
/// Non-curriculum variants skip this function entirely and keep the shared
/// difficulty cell at a fixed value.
///
/// # Example
///
/// ```rust
/// use ml_flappy::curriculum::compute_difficulty;
///
/// assert_eq!(compute_difficulty(0, 100), 0.0);
/// assert_eq!(compute_difficulty(50, 100), 0.5);
/// assert_eq!(compute_difficulty(100, 100), 1.0);
/// assert_eq!(compute_difficulty(250, 100), 1.0);
/// ```
pub fn compute_difficulty(global_step: usize, total_timesteps: usize) -> f32 {
    if total_timesteps == 0 {
        return 1.0;
    }
    let fraction = global_step as f64 / total_timesteps as f64;
    fraction.min(1.0) as f32
}
