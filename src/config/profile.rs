//! Training profiles and command-line overrides
//!
//! A profile is a typed pair of `train` and `vec` sections. Variants start
//! from the `default` profile, adjust named fields, and apply any
//! `section.key=value` overrides passed through from the command line.
//! Overrides are enumerated per key so a typo is a hard error instead of a
//! silently ignored dictionary entry.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while assembling a run configuration.
///
/// Any of these surfaces immediately; the run does not start.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The requested profile name is not known.
    #[error("unknown profile: {0}")]
    UnknownProfile(String),

    /// An override referenced a key that no section defines.
    #[error("unknown configuration key: {0}")]
    UnknownKey(String),

    /// An override value failed to parse or was out of range.
    #[error("invalid value for {key}: {value} ({reason})")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    /// The assembled configuration is internally inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Compute device for the policy and optimizer.
///
/// The bundled harness is CPU-only; `cuda` is accepted so checkpoint
/// loading can record the requested placement for the external trainer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
}

impl Default for Device {
    fn default() -> Self {
        Device::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
            Device::Cuda => write!(f, "cuda"),
        }
    }
}

impl FromStr for Device {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Device::Cpu),
            "cuda" => Ok(Device::Cuda),
            other => Err(format!("expected 'cpu' or 'cuda', got '{}'", other)),
        }
    }
}

/// The `train` section: trainer hyperparameters and run bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSection {
    /// Environment name registered with the external framework
    pub env: String,

    /// Total simulated environment steps for the whole run
    pub total_timesteps: usize,

    /// Initial learning rate
    pub learning_rate: f64,

    /// Whether the external trainer applies its own linear annealing
    pub anneal_lr: bool,

    /// Optimizer name understood by the external trainer
    pub optimizer: String,

    /// Discount factor
    pub gamma: f64,

    /// PPO clip coefficient
    pub clip_coef: f64,

    /// Entropy bonus coefficient
    pub ent_coef: f64,

    /// Minibatch size for optimization
    pub minibatch_size: usize,

    /// Environment steps collected per epoch (one rollout-collection phase)
    pub batch_size: usize,

    /// Whether the policy carries a recurrent core
    pub use_rnn: bool,

    /// Compute device
    pub device: Device,

    /// Output directory for checkpoints and run state
    pub data_dir: PathBuf,

    /// Random seed handed to the external framework
    pub seed: u64,
}

/// The `vec` section: vectorized-environment pool sizing.
///
/// `None` means "auto"; variants resolve auto values before launch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VecSection {
    /// Worker process count, or auto
    pub num_workers: Option<usize>,

    /// Concurrent environment count, or auto
    pub num_envs: Option<usize>,
}

impl VecSection {
    /// Resolve auto values the way the launch scripts do: two workers and
    /// at least `min_envs` environments.
    pub fn resolve(&self, min_envs: usize) -> (usize, usize) {
        let workers = self.num_workers.unwrap_or(2);
        let envs = match self.num_envs {
            Some(n) if n >= min_envs => n,
            _ => min_envs,
        };
        (workers, envs)
    }
}

/// A full training profile: `train` plus `vec`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub train: TrainSection,
    pub vec: VecSection,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            train: TrainSection {
                env: "flappy".to_string(),
                total_timesteps: 10_000_000,
                learning_rate: 3e-4,
                anneal_lr: true,
                optimizer: "adam".to_string(),
                gamma: 0.99,
                clip_coef: 0.2,
                ent_coef: 0.01,
                minibatch_size: 8192,
                batch_size: 8192,
                use_rnn: false,
                device: Device::Cpu,
                data_dir: PathBuf::from("experiments"),
                seed: 1,
            },
            vec: VecSection {
                num_workers: None,
                num_envs: None,
            },
        }
    }
}

/// Load a named profile.
///
/// Only `default` is built in; variants derive everything else from it.
///
/// # Example
///
/// ```rust
/// use ml_flappy::config::load_config;
///
/// let profile = load_config("default").unwrap();
/// assert_eq!(profile.train.optimizer, "adam");
/// assert!(load_config("nonexistent").is_err());
/// ```
pub fn load_config(profile: &str) -> Result<Profile, ConfigError> {
    match profile {
        "default" => Ok(Profile::default()),
        other => Err(ConfigError::UnknownProfile(other.to_string())),
    }
}

impl Profile {
    /// Apply one `section.key=value` override.
    ///
    /// Keys use the command-line spelling (`train.total-timesteps`) or the
    /// field spelling (`train.total_timesteps`); dashes are normalized to
    /// underscores. Unknown keys and unparseable values are errors.
    ///
    /// # Example
    ///
    /// ```rust
    /// use ml_flappy::config::load_config;
    ///
    /// let mut profile = load_config("default").unwrap();
    /// profile.apply_override("train.gamma", "0.95").unwrap();
    /// assert_eq!(profile.train.gamma, 0.95);
    /// ```
    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let normalized = key.replace('-', "_");
        match normalized.as_str() {
            "train.env" => self.train.env = value.to_string(),
            "train.total_timesteps" => {
                self.train.total_timesteps = parse_value(&normalized, value)?;
            }
            "train.learning_rate" => self.train.learning_rate = parse_value(&normalized, value)?,
            "train.anneal_lr" => self.train.anneal_lr = parse_value(&normalized, value)?,
            "train.optimizer" => self.train.optimizer = value.to_string(),
            "train.gamma" => self.train.gamma = parse_value(&normalized, value)?,
            "train.clip_coef" => self.train.clip_coef = parse_value(&normalized, value)?,
            "train.ent_coef" => self.train.ent_coef = parse_value(&normalized, value)?,
            "train.minibatch_size" => self.train.minibatch_size = parse_value(&normalized, value)?,
            "train.batch_size" => self.train.batch_size = parse_value(&normalized, value)?,
            "train.use_rnn" => self.train.use_rnn = parse_value(&normalized, value)?,
            "train.device" => {
                self.train.device =
                    Device::from_str(value).map_err(|reason| ConfigError::InvalidValue {
                        key: normalized.clone(),
                        value: value.to_string(),
                        reason,
                    })?;
            }
            "train.data_dir" | "train.output_dir" => {
                self.train.data_dir = PathBuf::from(value);
            }
            "train.seed" => self.train.seed = parse_value(&normalized, value)?,
            "vec.num_workers" => {
                self.vec.num_workers = parse_auto(&normalized, value)?;
            }
            "vec.num_envs" => {
                self.vec.num_envs = parse_auto(&normalized, value)?;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Apply a batch of `section.key=value` overrides, as passed through
    /// from the command line.
    pub fn apply_overrides<I, S>(&mut self, overrides: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entry in overrides {
            let entry = entry.as_ref();
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                ConfigError::Invalid(format!(
                    "override '{}' is not of the form section.key=value",
                    entry
                ))
            })?;
            self.apply_override(key.trim(), value.trim())?;
        }
        Ok(())
    }

    /// Validate the assembled profile before launch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.train.total_timesteps == 0 {
            return Err(ConfigError::Invalid(
                "train.total_timesteps must be positive".to_string(),
            ));
        }
        if self.train.learning_rate <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "train.learning_rate must be positive, got {}",
                self.train.learning_rate
            )));
        }
        if !(0.0..=1.0).contains(&self.train.gamma) {
            return Err(ConfigError::Invalid(format!(
                "train.gamma must be in [0, 1], got {}",
                self.train.gamma
            )));
        }
        if self.train.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "train.batch_size must be at least 1".to_string(),
            ));
        }
        if self.train.minibatch_size > self.train.batch_size {
            return Err(ConfigError::Invalid(format!(
                "train.minibatch_size ({}) cannot exceed train.batch_size ({})",
                self.train.minibatch_size, self.train.batch_size
            )));
        }
        Ok(())
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_auto(key: &str, value: &str) -> Result<Option<usize>, ConfigError> {
    if value == "auto" {
        return Ok(None);
    }
    parse_value(key, value).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = load_config("default").unwrap();
        assert_eq!(profile.train.learning_rate, 3e-4);
        assert_eq!(profile.train.optimizer, "adam");
        assert_eq!(profile.train.device, Device::Cpu);
        assert!(profile.vec.num_workers.is_none());
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_unknown_profile() {
        assert!(matches!(
            load_config("puffer_target"),
            Err(ConfigError::UnknownProfile(_))
        ));
    }

    #[test]
    fn test_override_dashed_key() {
        let mut profile = load_config("default").unwrap();
        profile
            .apply_override("train.total-timesteps", "100000000")
            .unwrap();
        assert_eq!(profile.train.total_timesteps, 100_000_000);
    }

    #[test]
    fn test_override_unknown_key() {
        let mut profile = load_config("default").unwrap();
        let err = profile.apply_override("train.warp_speed", "9").unwrap_err();
        assert!(matches!(err, ConfigError::UnknownKey(_)));
    }

    #[test]
    fn test_override_invalid_value() {
        let mut profile = load_config("default").unwrap();
        let err = profile
            .apply_override("train.learning_rate", "fast")
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_override_batch() {
        let mut profile = load_config("default").unwrap();
        profile
            .apply_overrides(["train.gamma=0.95", "vec.num_workers=4"])
            .unwrap();
        assert_eq!(profile.train.gamma, 0.95);
        assert_eq!(profile.vec.num_workers, Some(4));
    }

    #[test]
    fn test_override_malformed_entry() {
        let mut profile = load_config("default").unwrap();
        let err = profile.apply_overrides(["train.gamma 0.95"]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_override_auto_vec_values() {
        let mut profile = load_config("default").unwrap();
        profile.apply_override("vec.num_envs", "256").unwrap();
        assert_eq!(profile.vec.num_envs, Some(256));

        profile.apply_override("vec.num_envs", "auto").unwrap();
        assert_eq!(profile.vec.num_envs, None);
    }

    #[test]
    fn test_vec_resolution() {
        let vec = VecSection {
            num_workers: None,
            num_envs: None,
        };
        assert_eq!(vec.resolve(128), (2, 128));

        let vec = VecSection {
            num_workers: Some(8),
            num_envs: Some(64),
        };
        // Env count below the floor is clamped up.
        assert_eq!(vec.resolve(128), (8, 128));

        let vec = VecSection {
            num_workers: Some(8),
            num_envs: Some(512),
        };
        assert_eq!(vec.resolve(128), (8, 512));
    }

    #[test]
    fn test_validate_rejects_zero_timesteps() {
        let mut profile = load_config("default").unwrap();
        profile.train.total_timesteps = 0;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_minibatch_exceeding_batch() {
        let mut profile = load_config("default").unwrap();
        profile.train.minibatch_size = profile.train.batch_size + 1;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!("cpu".parse::<Device>().unwrap(), Device::Cpu);
        assert_eq!("cuda".parse::<Device>().unwrap(), Device::Cuda);
        assert!("tpu".parse::<Device>().is_err());
        assert_eq!(Device::Cuda.to_string(), "cuda");
    }

    #[test]
    fn test_profile_round_trips_through_json() {
        let profile = load_config("default").unwrap();
        let json = serde_json::to_string(&profile).unwrap();
        let restored: Profile = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.train.env, profile.train.env);
        assert_eq!(restored.train.batch_size, profile.train.batch_size);
    }
}
