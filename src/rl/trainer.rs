//! External trainer interface
//!
//! The surrounding framework owns rollout collection and optimization; the
//! orchestrator only needs the narrow surface below. The bundled
//! [`SimTrainer`](super::SimTrainer) implements it for in-process runs, and
//! tests drive the orchestrator with stubs.

use thiserror::Error;

/// Fatal failures during rollout collection or optimization.
///
/// Nothing here is retried: optimizer and environment state are not safely
/// resumable mid-epoch, so every failure aborts the current run.
#[derive(Debug, Error)]
pub enum TrainError {
    /// A simulation worker raised or crashed. Partial rollouts are not
    /// valid training data, so the epoch is abandoned.
    #[error("worker failure during rollout collection: {0}")]
    Worker(String),

    /// Out of memory or a similar hard resource limit.
    #[error("resource exhaustion: {0}; reduce vec.num_envs or vec.num_workers and retry")]
    ResourceExhaustion(String),

    /// The trainer was driven after `close()`.
    #[error("trainer already closed")]
    Closed,
}

/// One optimizer parameter group with a mutable learning-rate field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamGroup {
    pub learning_rate: f64,
}

/// Narrow interface of the external trainer.
///
/// `evaluate` runs one rollout-collection phase and advances `global_step`;
/// `train` runs one optimization phase and advances `epoch`; `close`
/// releases trainer and vectorized-environment resources. Both phases are
/// synchronous barriers: they return only once every worker has finished.
pub trait Trainer {
    /// Completed optimization phases.
    fn epoch(&self) -> usize;

    /// Epoch count at which the run terminates.
    fn total_epochs(&self) -> usize;

    /// Cumulative simulated environment steps collected so far.
    fn global_step(&self) -> usize;

    /// One rollout-collection phase across all workers.
    fn evaluate(&mut self) -> Result<(), TrainError>;

    /// One optimization phase.
    fn train(&mut self) -> Result<(), TrainError>;

    /// Release trainer and environment resources.
    fn close(&mut self) -> Result<(), TrainError>;

    /// The optimizer's parameter groups.
    fn param_groups(&self) -> &[ParamGroup];

    /// Mutable access for manual learning-rate scheduling.
    fn param_groups_mut(&mut self) -> &mut [ParamGroup];
}
