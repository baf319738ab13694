//! Launching training runs
//!
//! Provides:
//! - `RunPlan` assembly for the Flappy variants (variant module)
//! - `Orchestrator` - the epoch-loop state machine (orchestrator module)
//! - Progress sinks for per-epoch reporting (dashboard module)
//! - `run_plan` - execute an assembled plan end to end

pub mod dashboard;
pub mod orchestrator;
pub mod variant;

pub use dashboard::{EpochSnapshot, NoopSink, ProgressSink, StdoutDashboard};
pub use orchestrator::{CurriculumDrive, Orchestrator, Phase, ProgressClock, RunSummary};
pub use variant::{
    flappy_v1_plan, flappy_v2_plan, flappy_v3_plan, CommonOverrides, CurriculumMode, RunPlan,
    MIN_ENVS,
};

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::curriculum::difficulty_cell;
use crate::rl::{latest_checkpoint, load_checkpoint, PolicyState, SimTrainer};

/// Execute an assembled run plan against the bundled harness trainer.
pub fn run_plan(plan: &RunPlan) -> Result<RunSummary> {
    run_plan_with_sink(plan, &mut StdoutDashboard::new())
}

/// Execute a run plan, reporting epochs to the given sink.
pub fn run_plan_with_sink(plan: &RunPlan, sink: &mut dyn ProgressSink) -> Result<RunSummary> {
    plan.validate()
        .with_context(|| format!("invalid {} configuration", plan.name))?;

    let data_dir = &plan.profile.train.data_dir;
    fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create output directory {:?}", data_dir))?;
    println!("[{}] checkpoint dir: {:?}", plan.name, data_dir);

    print_header(plan);

    // The cell exists before any worker starts; curriculum runs begin at
    // zero difficulty, fixed runs begin (and stay) at the fixed value.
    let initial_difficulty = match plan.curriculum {
        CurriculumMode::Paced => 0.0,
        CurriculumMode::Fixed(value) => value,
    };
    let (writer, reader) = difficulty_cell(initial_difficulty);

    let policy = load_initial_policy(plan)?;

    let (num_workers, _num_envs) = plan.profile.vec.resolve(MIN_ENVS);
    let trainer = SimTrainer::new(&plan.profile.train, num_workers, reader, policy);

    let drive = match plan.curriculum {
        CurriculumMode::Paced => CurriculumDrive::Paced(writer),
        CurriculumMode::Fixed(value) => CurriculumDrive::Fixed(value),
    };
    let orchestrator = Orchestrator::new(
        trainer,
        plan.profile.train.total_timesteps,
        drive,
        plan.manual_lr,
    );

    let summary = orchestrator
        .run(sink)
        .with_context(|| format!("{} training run failed", plan.name))?;

    println!(
        "Training finished. Check {:?} for checkpoints.",
        plan.profile.train.data_dir
    );
    Ok(summary)
}

/// Resolve and strictly load the checkpoint a plan resumes from, if any.
///
/// A directory argument resolves to the newest `model_*.json` inside it.
fn load_initial_policy(plan: &RunPlan) -> Result<Option<PolicyState>> {
    let Some(requested) = &plan.load_checkpoint else {
        return Ok(None);
    };

    let path: PathBuf = if requested.is_dir() {
        latest_checkpoint(requested).with_context(|| {
            format!("no model_*.json checkpoint found under {:?}", requested)
        })?
    } else {
        requested.clone()
    };

    let state = load_checkpoint(&path, plan.profile.train.device, &plan.policy_spec)
        .with_context(|| format!("failed to load checkpoint {:?}", path))?;
    println!("Loaded policy from {:?} (fine-tuning)", path);
    Ok(Some(state))
}

fn print_header(plan: &RunPlan) {
    let train = &plan.profile.train;
    println!("{}", "=".repeat(70));
    println!("Flappy RL Training - {}", plan.name);
    println!("{}", "=".repeat(70));
    println!("Env: {}", train.env);
    println!("Total timesteps: {}", train.total_timesteps);
    println!("Optimizer: {} (lr {})", train.optimizer, train.learning_rate);
    match plan.curriculum {
        CurriculumMode::Paced => println!("Difficulty: curriculum-paced"),
        CurriculumMode::Fixed(value) => println!("Difficulty: fixed at {}", value),
    }
    match &plan.manual_lr {
        Some(schedule) => println!(
            "LR schedule: manual linear {} -> {}",
            schedule.initial_lr, schedule.final_lr
        ),
        None if train.anneal_lr => println!("LR schedule: trainer-managed annealing"),
        None => println!("LR schedule: constant"),
    }
    let (workers, envs) = plan.profile.vec.resolve(MIN_ENVS);
    println!("Vec: {} workers, {} envs", workers, envs);
    println!("Device: {}", train.device);
    println!("{}", "=".repeat(70));
}
