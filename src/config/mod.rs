//! Training run configuration
//!
//! Provides:
//! - `Profile` - typed `train`/`vec` sections loaded from a named profile
//! - Enumerated `section.key=value` overrides from the command line
//! - `Device` - compute device selection

pub mod profile;

pub use profile::{load_config, ConfigError, Device, Profile, TrainSection, VecSection};
