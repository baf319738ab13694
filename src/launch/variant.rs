//! Variant assembly
//!
//! Each Flappy variant is a named run plan derived from the default
//! profile: hyperparameter adjustments, the curriculum mode, the optional
//! manual learning-rate schedule, and the policy family checkpoints are
//! matched against. Plans are built once, validated, and never mutated
//! mid-run.

use std::path::PathBuf;

use crate::config::{load_config, ConfigError, Profile};
use crate::rl::{LinearLrSchedule, PolicySpec};

/// Flappy observation vector length.
pub const FLAPPY_OBS_SIZE: usize = 8;

/// Flappy action count: flap or glide.
pub const FLAPPY_ACTIONS: usize = 2;

/// Encoder width of the baseline MLP policy.
pub const MLP_HIDDEN: usize = 64;

/// Encoder and recurrent-core width of the LSTM policy family.
pub const LSTM_HIDDEN: usize = 128;

/// Environment count floor applied when resolving the `vec` section.
pub const MIN_ENVS: usize = 128;

/// How the run drives the shared difficulty cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurriculumMode {
    /// Difficulty follows the schedule as training progresses.
    Paced,

    /// Difficulty is fixed for the whole run.
    Fixed(f32),
}

/// Launch flags shared by every variant.
#[derive(Debug, Clone, Default)]
pub struct CommonOverrides {
    pub total_timesteps: Option<usize>,
    pub load_checkpoint: Option<PathBuf>,
    pub learning_rate: Option<f64>,
    pub output_dir: Option<PathBuf>,
    /// Pass-through `section.key=value` overrides for the config loader
    pub extra: Vec<String>,
}

/// A fully assembled, immutable run plan.
#[derive(Debug, Clone)]
pub struct RunPlan {
    /// Variant tag used in log lines
    pub name: &'static str,
    pub profile: Profile,
    pub curriculum: CurriculumMode,
    /// Present only for variants that manage annealing manually
    pub manual_lr: Option<LinearLrSchedule>,
    pub load_checkpoint: Option<PathBuf>,
    /// Parameter names/shapes of the policy this variant constructs
    pub policy_spec: PolicySpec,
}

impl RunPlan {
    /// Validate the plan before launch.
    ///
    /// Besides per-field profile checks, this closes two configuration
    /// gaps: manual and trainer-side annealing cannot both be enabled, and
    /// a fixed difficulty must be a valid difficulty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.profile.validate()?;

        if let Some(schedule) = &self.manual_lr {
            schedule.validate().map_err(ConfigError::Invalid)?;
            if self.profile.train.anneal_lr {
                return Err(ConfigError::Invalid(
                    "train.anneal_lr and the manual learning-rate schedule cannot both \
                     be enabled; the learning rate would be annealed twice"
                        .to_string(),
                ));
            }
        }

        if let CurriculumMode::Fixed(difficulty) = self.curriculum {
            if !(0.0..=1.0).contains(&difficulty) {
                return Err(ConfigError::Invalid(format!(
                    "env.fixed-difficulty must be in [0, 1], got {}",
                    difficulty
                )));
            }
        }

        Ok(())
    }
}

fn apply_common(
    profile: &mut Profile,
    overrides: &CommonOverrides,
    default_output_dir: &str,
) -> Result<(), ConfigError> {
    if let Some(total) = overrides.total_timesteps {
        profile.train.total_timesteps = total;
    }
    if let Some(lr) = overrides.learning_rate {
        profile.train.learning_rate = lr;
    }
    profile.train.data_dir = overrides
        .output_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from(default_output_dir));
    profile.apply_overrides(&overrides.extra)?;
    Ok(())
}

/// Baseline MLP run: no curriculum, trainer-managed annealing.
pub fn flappy_v1_plan(overrides: &CommonOverrides) -> Result<RunPlan, ConfigError> {
    let mut profile = load_config("default")?;
    profile.train.env = "flappy_grid".to_string();
    profile.train.total_timesteps = 2_000_000;
    profile.train.optimizer = "adam".to_string();
    profile.train.learning_rate = 0.01;
    profile.train.clip_coef = 0.5;
    apply_common(&mut profile, overrides, "experiments/flappyv1")?;

    Ok(RunPlan {
        name: "flappyv1",
        profile,
        curriculum: CurriculumMode::Fixed(1.0),
        manual_lr: None,
        load_checkpoint: overrides.load_checkpoint.clone(),
        policy_spec: PolicySpec::flappy_mlp(FLAPPY_OBS_SIZE, MLP_HIDDEN, FLAPPY_ACTIONS),
    })
}

/// Curriculum run with an LSTM policy and a manual linear learning-rate
/// schedule decaying to a sixth of the initial rate.
pub fn flappy_v2_plan(overrides: &CommonOverrides) -> Result<RunPlan, ConfigError> {
    let mut profile = load_config("default")?;
    profile.train.env = "flappyv2_curriculum".to_string();
    profile.train.total_timesteps = 150_000_000;
    profile.train.optimizer = "adam".to_string();
    profile.train.learning_rate = 3e-4;
    profile.train.clip_coef = 0.2;
    profile.train.ent_coef = 0.01;
    profile.train.use_rnn = true;
    // The manual schedule replaces the trainer's annealing.
    profile.train.anneal_lr = false;
    apply_common(&mut profile, overrides, "experiments/flappyv2")?;

    let initial_lr = profile.train.learning_rate;
    Ok(RunPlan {
        name: "flappyv2",
        profile,
        curriculum: CurriculumMode::Paced,
        manual_lr: Some(LinearLrSchedule::new(initial_lr, initial_lr / 6.0)),
        load_checkpoint: overrides.load_checkpoint.clone(),
        policy_spec: PolicySpec::flappy_lstm(
            FLAPPY_OBS_SIZE,
            LSTM_HIDDEN,
            LSTM_HIDDEN,
            FLAPPY_ACTIONS,
        ),
    })
}

/// Target-style run: fixed difficulty throughout, trainer-managed
/// annealing, muon optimizer.
pub fn flappy_v3_plan(
    fixed_difficulty: f32,
    overrides: &CommonOverrides,
) -> Result<RunPlan, ConfigError> {
    let mut profile = load_config("default")?;
    profile.train.env = "flappyv3_targetlike".to_string();
    profile.train.total_timesteps = 100_000_000;
    profile.train.optimizer = "muon".to_string();
    profile.train.learning_rate = 0.015;
    profile.train.gamma = 0.99;
    profile.train.minibatch_size = 32_768;
    profile.train.batch_size = 32_768;
    profile.train.ent_coef = 0.02;
    profile.train.anneal_lr = true;
    profile.train.use_rnn = true;
    apply_common(&mut profile, overrides, "experiments/flappyv3")?;

    Ok(RunPlan {
        name: "flappyv3",
        profile,
        curriculum: CurriculumMode::Fixed(fixed_difficulty),
        manual_lr: None,
        load_checkpoint: overrides.load_checkpoint.clone(),
        policy_spec: PolicySpec::flappy_lstm(
            FLAPPY_OBS_SIZE,
            LSTM_HIDDEN,
            LSTM_HIDDEN,
            FLAPPY_ACTIONS,
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_v1_plan_defaults() {
        let plan = flappy_v1_plan(&CommonOverrides::default()).unwrap();
        assert_eq!(plan.profile.train.env, "flappy_grid");
        assert_eq!(plan.profile.train.total_timesteps, 2_000_000);
        assert_eq!(plan.profile.train.learning_rate, 0.01);
        assert_eq!(plan.profile.train.clip_coef, 0.5);
        assert_eq!(plan.curriculum, CurriculumMode::Fixed(1.0));
        assert!(plan.manual_lr.is_none());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_v2_plan_defaults() {
        let plan = flappy_v2_plan(&CommonOverrides::default()).unwrap();
        assert_eq!(plan.profile.train.env, "flappyv2_curriculum");
        assert_eq!(plan.profile.train.total_timesteps, 150_000_000);
        assert_eq!(plan.curriculum, CurriculumMode::Paced);
        assert!(!plan.profile.train.anneal_lr);

        let schedule = plan.manual_lr.unwrap();
        assert_eq!(schedule.initial_lr, 3e-4);
        assert_eq!(schedule.final_lr, 3e-4 / 6.0);
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_v2_schedule_tracks_learning_rate_override() {
        let overrides = CommonOverrides {
            learning_rate: Some(0.01),
            ..Default::default()
        };
        let plan = flappy_v2_plan(&overrides).unwrap();
        let schedule = plan.manual_lr.unwrap();
        assert_eq!(schedule.initial_lr, 0.01);
        assert_eq!(schedule.final_lr, 0.01 / 6.0);
    }

    #[test]
    fn test_v2_rejects_double_annealing() {
        let overrides = CommonOverrides {
            extra: vec!["train.anneal_lr=true".to_string()],
            ..Default::default()
        };
        let plan = flappy_v2_plan(&overrides).unwrap();
        let err = plan.validate().unwrap_err();
        assert!(err.to_string().contains("annealed twice"));
    }

    #[test]
    fn test_v3_plan_defaults() {
        let plan = flappy_v3_plan(1.0, &CommonOverrides::default()).unwrap();
        assert_eq!(plan.profile.train.env, "flappyv3_targetlike");
        assert_eq!(plan.profile.train.optimizer, "muon");
        assert_eq!(plan.profile.train.learning_rate, 0.015);
        assert_eq!(plan.profile.train.minibatch_size, 32_768);
        assert!(plan.profile.train.anneal_lr);
        assert_eq!(plan.curriculum, CurriculumMode::Fixed(1.0));
        assert!(plan.manual_lr.is_none());
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_v3_rejects_out_of_range_difficulty() {
        let plan = flappy_v3_plan(1.5, &CommonOverrides::default()).unwrap();
        assert!(plan.validate().is_err());

        let plan = flappy_v3_plan(-0.1, &CommonOverrides::default()).unwrap();
        assert!(plan.validate().is_err());
    }

    #[test]
    fn test_common_flags_applied() {
        let overrides = CommonOverrides {
            total_timesteps: Some(100_000),
            output_dir: Some(PathBuf::from("runs/smoke")),
            ..Default::default()
        };
        let plan = flappy_v2_plan(&overrides).unwrap();
        assert_eq!(plan.profile.train.total_timesteps, 100_000);
        assert_eq!(plan.profile.train.data_dir, PathBuf::from("runs/smoke"));
    }

    #[test]
    fn test_extra_overrides_applied_last() {
        let overrides = CommonOverrides {
            extra: vec!["train.ent_coef=0.05".to_string(), "vec.num_workers=4".to_string()],
            ..Default::default()
        };
        let plan = flappy_v3_plan(0.5, &overrides).unwrap();
        assert_eq!(plan.profile.train.ent_coef, 0.05);
        assert_eq!(plan.profile.vec.num_workers, Some(4));
    }

    #[test]
    fn test_unknown_extra_override_rejected() {
        let overrides = CommonOverrides {
            extra: vec!["train.turbo=yes".to_string()],
            ..Default::default()
        };
        assert!(flappy_v1_plan(&overrides).is_err());
    }

    #[test]
    fn test_policy_specs_match_variant_family() {
        let v1 = flappy_v1_plan(&CommonOverrides::default()).unwrap();
        assert!(v1.policy_spec.shape("lstm.weight_ih_l0").is_none());

        let v2 = flappy_v2_plan(&CommonOverrides::default()).unwrap();
        assert!(v2.policy_spec.shape("lstm.weight_ih_l0").is_some());
    }
}
