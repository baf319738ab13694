//! ML Flappy - launcher for reinforcement-learning training runs on the
//! Flappy game environments
//!
//! This library provides:
//! - Training profile loading and command-line overrides (config module)
//! - Curriculum difficulty scheduling and the shared difficulty cell
//!   consumed by environment workers (curriculum module)
//! - The external-trainer seam, learning-rate annealing, and strict
//!   checkpoint loading for fine-tuning continuation (rl module)
//! - Variant assembly and the epoch-loop orchestrator (launch module)
//! - Rolling run statistics for the dashboard (metrics module)
//!
//! Rollout collection, optimization, and the game simulation itself are
//! supplied by the surrounding framework; this crate owns the launch glue
//! and the curriculum-paced coordination loop.

pub mod config;
pub mod curriculum;
pub mod launch;
pub mod metrics;
pub mod rl;
