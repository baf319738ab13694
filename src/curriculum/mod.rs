//! Curriculum pacing for the Flappy environments
//!
//! Provides:
//! - The difficulty schedule mapping training progress to task difficulty
//! - The shared difficulty cell written by the orchestrator and read by
//!   concurrently running environment workers

pub mod channel;
pub mod scheduler;

pub use channel::{difficulty_cell, DifficultyReader, DifficultyWriter};
pub use scheduler::compute_difficulty;
