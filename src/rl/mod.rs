//! Reinforcement-learning collaborator seam
//!
//! Provides:
//! - `Trainer` - the narrow interface of the external trainer
//! - `LinearLrSchedule` - manual learning-rate annealing
//! - Strict checkpoint loading for fine-tuning continuation
//! - `SimTrainer` - in-process harness exercising the launch path

pub mod annealer;
pub mod checkpoint;
pub mod harness;
pub mod trainer;

pub use annealer::LinearLrSchedule;
pub use checkpoint::{
    latest_checkpoint, load_checkpoint, save_policy_state, CheckpointError, ParamTensor,
    PolicySpec, PolicyState,
};
pub use harness::SimTrainer;
pub use trainer::{ParamGroup, TrainError, Trainer};
