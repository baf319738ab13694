//! In-process trainer harness
//!
//! `SimTrainer` is the bundled implementation of the [`Trainer`] seam. It
//! performs no learning: `evaluate` drives a pool of worker threads that
//! step counter environments while reading the shared difficulty cell, and
//! `train` advances the epoch counter (applying the trainer-side annealing
//! when `anneal_lr` is enabled). This exercises the full launch path
//! (progress accounting, difficulty propagation, learning-rate plumbing)
//! without the external PPO backend, which plugs in behind the same trait.

use std::thread;

use crate::config::TrainSection;
use crate::curriculum::DifficultyReader;
use crate::rl::checkpoint::PolicyState;
use crate::rl::trainer::{ParamGroup, TrainError, Trainer};

/// In-process stand-in for the external trainer.
pub struct SimTrainer {
    epoch: usize,
    total_epochs: usize,
    global_step: usize,
    total_timesteps: usize,
    batch_size: usize,
    num_workers: usize,
    difficulty: DifficultyReader,
    param_groups: Vec<ParamGroup>,
    initial_lr: f64,
    anneal_lr: bool,
    initial_policy: Option<PolicyState>,
    closed: bool,
}

impl SimTrainer {
    /// Build a harness trainer from a resolved `train` section.
    ///
    /// `total_epochs` is derived the way the external trainer derives it:
    /// one epoch per collected batch, rounded up to cover the full
    /// timestep budget.
    pub fn new(
        train: &TrainSection,
        num_workers: usize,
        difficulty: DifficultyReader,
        initial_policy: Option<PolicyState>,
    ) -> Self {
        let total_epochs = train.total_timesteps.div_ceil(train.batch_size);
        Self {
            epoch: 0,
            total_epochs,
            global_step: 0,
            total_timesteps: train.total_timesteps,
            batch_size: train.batch_size,
            num_workers: num_workers.max(1),
            difficulty,
            param_groups: vec![ParamGroup {
                learning_rate: train.learning_rate,
            }],
            initial_lr: train.learning_rate,
            anneal_lr: train.anneal_lr,
            initial_policy,
            closed: false,
        }
    }

    /// The policy snapshot the run was resumed from, if any.
    pub fn initial_policy(&self) -> Option<&PolicyState> {
        self.initial_policy.as_ref()
    }

    /// Difficulty observed by the last worker pool, for the dashboard.
    pub fn observed_difficulty(&self) -> f32 {
        self.difficulty.load()
    }
}

impl Trainer for SimTrainer {
    fn epoch(&self) -> usize {
        self.epoch
    }

    fn total_epochs(&self) -> usize {
        self.total_epochs
    }

    fn global_step(&self) -> usize {
        self.global_step
    }

    fn evaluate(&mut self) -> Result<(), TrainError> {
        if self.closed {
            return Err(TrainError::Closed);
        }

        let steps_per_worker = self.batch_size / self.num_workers;
        let remainder = self.batch_size % self.num_workers;

        let handles: Vec<_> = (0..self.num_workers)
            .map(|worker| {
                let reader = self.difficulty.clone();
                let steps = steps_per_worker + usize::from(worker < remainder);
                thread::spawn(move || {
                    // Each simulated step re-reads the cell, the way a real
                    // environment worker reparametrizes generation.
                    let mut stepped = 0usize;
                    for _ in 0..steps {
                        let _difficulty = reader.load();
                        stepped += 1;
                    }
                    stepped
                })
            })
            .collect();

        let mut collected = 0usize;
        for (worker, handle) in handles.into_iter().enumerate() {
            let stepped = handle
                .join()
                .map_err(|_| TrainError::Worker(format!("worker {} panicked", worker)))?;
            collected += stepped;
        }

        self.global_step += collected;
        Ok(())
    }

    fn train(&mut self) -> Result<(), TrainError> {
        if self.closed {
            return Err(TrainError::Closed);
        }

        self.epoch += 1;

        if self.anneal_lr {
            // Trainer-managed annealing: linear decay to zero over the run,
            // matching the external trainer's default behavior.
            let fraction = if self.total_timesteps == 0 {
                1.0
            } else {
                (self.global_step as f64 / self.total_timesteps as f64).min(1.0)
            };
            let lr = self.initial_lr * (1.0 - fraction);
            for group in &mut self.param_groups {
                group.learning_rate = lr;
            }
        }

        Ok(())
    }

    fn close(&mut self) -> Result<(), TrainError> {
        self.closed = true;
        Ok(())
    }

    fn param_groups(&self) -> &[ParamGroup] {
        &self.param_groups
    }

    fn param_groups_mut(&mut self) -> &mut [ParamGroup] {
        &mut self.param_groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use crate::curriculum::difficulty_cell;

    fn small_train_section() -> TrainSection {
        let mut profile = load_config("default").unwrap();
        profile.train.total_timesteps = 1_000;
        profile.train.batch_size = 256;
        profile.train.anneal_lr = false;
        profile.train
    }

    #[test]
    fn test_total_epochs_covers_timestep_budget() {
        let (_writer, reader) = difficulty_cell(0.0);
        let trainer = SimTrainer::new(&small_train_section(), 2, reader, None);
        // 1000 steps at 256 per epoch: four epochs.
        assert_eq!(trainer.total_epochs(), 4);
    }

    #[test]
    fn test_evaluate_advances_global_step_by_batch() {
        let (_writer, reader) = difficulty_cell(0.0);
        let mut trainer = SimTrainer::new(&small_train_section(), 3, reader, None);

        trainer.evaluate().unwrap();
        assert_eq!(trainer.global_step(), 256);
        trainer.evaluate().unwrap();
        assert_eq!(trainer.global_step(), 512);
    }

    #[test]
    fn test_train_advances_epoch() {
        let (_writer, reader) = difficulty_cell(0.0);
        let mut trainer = SimTrainer::new(&small_train_section(), 2, reader, None);

        trainer.train().unwrap();
        trainer.train().unwrap();
        assert_eq!(trainer.epoch(), 2);
    }

    #[test]
    fn test_internal_annealing_decays_to_zero() {
        let mut train = small_train_section();
        train.anneal_lr = true;
        train.learning_rate = 0.015;
        let (_writer, reader) = difficulty_cell(1.0);
        let mut trainer = SimTrainer::new(&train, 2, reader, None);

        let mut previous = trainer.param_groups()[0].learning_rate;
        while trainer.epoch() < trainer.total_epochs() {
            trainer.evaluate().unwrap();
            trainer.train().unwrap();
            let current = trainer.param_groups()[0].learning_rate;
            assert!(current <= previous);
            previous = current;
        }
        assert!(previous.abs() < 1e-12);
    }

    #[test]
    fn test_no_annealing_when_disabled() {
        let (_writer, reader) = difficulty_cell(0.0);
        let mut trainer = SimTrainer::new(&small_train_section(), 2, reader, None);

        trainer.evaluate().unwrap();
        trainer.train().unwrap();
        assert_eq!(trainer.param_groups()[0].learning_rate, 3e-4);
    }

    #[test]
    fn test_workers_observe_current_difficulty() {
        let (writer, reader) = difficulty_cell(0.0);
        let mut trainer = SimTrainer::new(&small_train_section(), 4, reader, None);

        writer.store(0.42);
        trainer.evaluate().unwrap();
        assert_eq!(trainer.observed_difficulty(), 0.42);
    }

    #[test]
    fn test_closed_trainer_rejects_phases() {
        let (_writer, reader) = difficulty_cell(0.0);
        let mut trainer = SimTrainer::new(&small_train_section(), 2, reader, None);

        trainer.close().unwrap();
        assert!(matches!(trainer.evaluate(), Err(TrainError::Closed)));
        assert!(matches!(trainer.train(), Err(TrainError::Closed)));
    }
}
