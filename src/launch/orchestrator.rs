//! Training orchestration
//!
//! The orchestrator owns the progress clock and drives the epoch loop
//! sequentially: difficulty update, manual learning-rate update, rollout
//! collection, optimization, reporting. Concurrency lives underneath the
//! rollout-collection phase inside the external trainer; none of the steps
//! here overlap with each other.
//!
//! Phases run strictly forward: `INITIALIZING → RUNNING → FINALIZING →
//! DONE`. `run` consumes the orchestrator, so a finished run cannot be
//! restarted. Any failure during rollout or optimization propagates
//! immediately: training steps are not safely re-runnable mid-epoch, so
//! there is no retry and no cleanup of a half-finished epoch.

use crate::curriculum::{compute_difficulty, DifficultyWriter};
use crate::launch::dashboard::{EpochSnapshot, ProgressSink};
use crate::rl::{LinearLrSchedule, TrainError, Trainer};

/// Orchestrator lifecycle phase. No backward transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initializing,
    Running,
    Finalizing,
    Done,
}

/// The orchestrator's view of training progress.
///
/// `global_step` and `epoch` are monotone counters supplied by the external
/// trainer after each phase; the totals come from configuration.
#[derive(Debug, Clone, Copy)]
pub struct ProgressClock {
    pub global_step: usize,
    pub epoch: usize,
    pub total_timesteps: usize,
    pub total_epochs: usize,
}

impl ProgressClock {
    /// Fraction of the timestep budget consumed, in `[0, 1]`.
    pub fn progress_fraction(&self) -> f64 {
        if self.total_timesteps == 0 {
            return 1.0;
        }
        (self.global_step as f64 / self.total_timesteps as f64).min(1.0)
    }

    /// The loop terminates exactly when the epoch budget is spent.
    pub fn finished(&self) -> bool {
        self.epoch >= self.total_epochs
    }

    /// Adopt counters reported by the trainer. Both are monotone; a stale
    /// report never rolls the clock backwards.
    pub fn sync(&mut self, global_step: usize, epoch: usize) {
        self.global_step = self.global_step.max(global_step);
        self.epoch = self.epoch.max(epoch);
    }
}

/// How the shared difficulty cell is driven during the run.
pub enum CurriculumDrive {
    /// Curriculum variants: the orchestrator rewrites the cell every epoch
    /// from the difficulty schedule.
    Paced(DifficultyWriter),

    /// Fixed-difficulty variants: the cell was created at this value and is
    /// never rewritten.
    Fixed(f32),
}

/// Result of a completed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub phase: Phase,
    pub epochs_completed: usize,
    pub global_step: usize,
}

/// Drives the epoch loop against an external trainer.
pub struct Orchestrator<T: Trainer> {
    trainer: T,
    clock: ProgressClock,
    curriculum: CurriculumDrive,
    manual_lr: Option<LinearLrSchedule>,
    current_difficulty: f32,
    phase: Phase,
}

impl<T: Trainer> Orchestrator<T> {
    /// Construct the orchestrator around an initialized trainer.
    ///
    /// The clock adopts the trainer's current counters, so resuming a run
    /// whose trainer restores its own progress picks up mid-schedule.
    pub fn new(
        trainer: T,
        total_timesteps: usize,
        curriculum: CurriculumDrive,
        manual_lr: Option<LinearLrSchedule>,
    ) -> Self {
        let clock = ProgressClock {
            global_step: trainer.global_step(),
            epoch: trainer.epoch(),
            total_timesteps,
            total_epochs: trainer.total_epochs(),
        };
        let current_difficulty = match &curriculum {
            CurriculumDrive::Paced(writer) => writer.load(),
            CurriculumDrive::Fixed(value) => *value,
        };
        Self {
            trainer,
            clock,
            curriculum,
            manual_lr,
            current_difficulty,
            phase: Phase::Initializing,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Current progress clock.
    pub fn clock(&self) -> ProgressClock {
        self.clock
    }

    /// Run the epoch loop to completion.
    ///
    /// Consumes the orchestrator; the returned summary carries the terminal
    /// phase. Errors from the trainer abort the run without closing it.
    pub fn run(mut self, sink: &mut dyn ProgressSink) -> Result<RunSummary, TrainError> {
        self.phase = Phase::Running;

        while !self.clock.finished() {
            let steps_before = self.clock.global_step;

            if let CurriculumDrive::Paced(writer) = &self.curriculum {
                let difficulty =
                    compute_difficulty(self.clock.global_step, self.clock.total_timesteps);
                writer.store(difficulty);
                self.current_difficulty = difficulty;
            }

            if let Some(schedule) = &self.manual_lr {
                schedule.apply(
                    self.clock.progress_fraction(),
                    self.trainer.param_groups_mut(),
                );
            }

            self.trainer.evaluate()?;
            self.trainer.train()?;
            self.clock
                .sync(self.trainer.global_step(), self.trainer.epoch());

            let learning_rate = self
                .trainer
                .param_groups()
                .first()
                .map(|group| group.learning_rate)
                .unwrap_or(0.0);
            sink.on_epoch(&EpochSnapshot {
                epoch: self.clock.epoch,
                total_epochs: self.clock.total_epochs,
                global_step: self.clock.global_step,
                total_timesteps: self.clock.total_timesteps,
                steps_collected: self.clock.global_step - steps_before,
                difficulty: self.current_difficulty,
                learning_rate,
            });
        }

        self.phase = Phase::Finalizing;
        self.trainer.close()?;
        self.phase = Phase::Done;

        Ok(RunSummary {
            phase: self.phase,
            epochs_completed: self.clock.epoch,
            global_step: self.clock.global_step,
        })
    }
}
