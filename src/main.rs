use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ml_flappy::launch::{
    flappy_v1_plan, flappy_v2_plan, flappy_v3_plan, run_plan, CommonOverrides,
};

#[derive(Parser)]
#[command(name = "ml_flappy")]
#[command(version, about = "Launcher for Flappy RL training runs")]
struct Cli {
    #[command(subcommand)]
    variant: Variant,
}

#[derive(Subcommand)]
enum Variant {
    /// Baseline MLP run (no curriculum)
    V1(CommonArgs),

    /// Curriculum-paced LSTM run with manual learning-rate annealing
    V2(CommonArgs),

    /// Fixed-difficulty LSTM run with trainer-managed annealing
    V3(V3Args),
}

#[derive(Args)]
struct CommonArgs {
    /// Total simulated environment steps for the run
    #[arg(long = "train.total-timesteps")]
    total_timesteps: Option<usize>,

    /// Checkpoint file (or run directory) to fine-tune from
    #[arg(long = "train.load-checkpoint")]
    load_checkpoint: Option<PathBuf>,

    /// Initial learning rate
    #[arg(long = "train.learning-rate")]
    learning_rate: Option<f64>,

    /// Output directory for checkpoints and run state
    #[arg(long = "train.output-dir")]
    output_dir: Option<PathBuf>,

    /// Extra section.key=value overrides passed to the configuration
    /// loader, after `--`
    #[arg(last = true)]
    overrides: Vec<String>,
}

#[derive(Args)]
struct V3Args {
    #[command(flatten)]
    common: CommonArgs,

    /// Difficulty held fixed for the whole run, in [0, 1]
    #[arg(long = "env.fixed-difficulty", default_value_t = 1.0)]
    fixed_difficulty: f32,
}

impl From<CommonArgs> for CommonOverrides {
    fn from(args: CommonArgs) -> Self {
        CommonOverrides {
            total_timesteps: args.total_timesteps,
            load_checkpoint: args.load_checkpoint,
            learning_rate: args.learning_rate,
            output_dir: args.output_dir,
            extra: args.overrides,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let plan = match cli.variant {
        Variant::V1(args) => flappy_v1_plan(&args.into())?,
        Variant::V2(args) => flappy_v2_plan(&args.into())?,
        Variant::V3(args) => flappy_v3_plan(args.fixed_difficulty, &args.common.into())?,
    };

    run_plan(&plan)?;
    Ok(())
}
