//! Checkpoint loading for fine-tuning continuation
//!
//! A checkpoint is a serialized snapshot of policy parameters keyed by
//! parameter name. Loading is strict: every parameter of the freshly
//! constructed policy must be present with the exact shape, and nothing
//! extra may remain. Silent shape mismatches are a common, hard-to-diagnose
//! failure mode in fine-tuning workflows, so the loader fails loudly and
//! never loads partial state.
//!
//! Checkpoints written under distributed training carry a wrapper-induced
//! `module.` prefix on every key; the loader strips it before matching.
//!
//! Resuming from a checkpoint restores parameters only. It has no effect on
//! the progress clock.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::Device;

/// Name prefix added by distributed-training wrappers.
pub const DISTRIBUTED_PREFIX: &str = "module.";

/// Errors raised while loading a checkpoint. All of them abort the run
/// before training starts.
#[derive(Debug, Error)]
pub enum CheckpointError {
    /// The path does not exist or is not a regular file.
    #[error("checkpoint not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but does not parse as a checkpoint.
    #[error("malformed checkpoint {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// A parameter name or shape does not match the freshly constructed
    /// policy. No partial loads, no silent skips.
    #[error("checkpoint mismatch: {0}")]
    Mismatch(String),

    #[error("checkpoint io error: {0}")]
    Io(#[from] std::io::Error),
}

/// One named parameter tensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamTensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl ParamTensor {
    /// Number of elements the shape implies.
    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }
}

/// A loaded policy snapshot: parameters keyed by name, plus the device the
/// snapshot was mapped to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyState {
    pub parameters: BTreeMap<String, ParamTensor>,
    pub device: Device,
}

/// Expected parameter names and shapes of a freshly constructed policy.
///
/// The policy itself lives in the external framework; the spec is the
/// contract the loader matches checkpoints against.
#[derive(Debug, Clone, Default)]
pub struct PolicySpec {
    shapes: BTreeMap<String, Vec<usize>>,
}

impl PolicySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one expected parameter.
    pub fn with_param(mut self, name: &str, shape: &[usize]) -> Self {
        self.shapes.insert(name.to_string(), shape.to_vec());
        self
    }

    /// Number of expected parameters.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Expected shape of a named parameter.
    pub fn shape(&self, name: &str) -> Option<&[usize]> {
        self.shapes.get(name).map(Vec::as_slice)
    }

    /// The two-hidden-layer MLP policy used by the baseline variant:
    /// encoder stack plus action and value heads.
    pub fn flappy_mlp(obs_size: usize, hidden: usize, n_actions: usize) -> Self {
        Self::new()
            .with_param("net.0.weight", &[hidden, obs_size])
            .with_param("net.0.bias", &[hidden])
            .with_param("net.2.weight", &[hidden, hidden])
            .with_param("net.2.bias", &[hidden])
            .with_param("action_head.weight", &[n_actions, hidden])
            .with_param("action_head.bias", &[n_actions])
            .with_param("value_head.weight", &[1, hidden])
            .with_param("value_head.bias", &[1])
    }

    /// The recurrent policy used by the v2/v3 variants: the MLP encoder
    /// wrapped with an LSTM core.
    pub fn flappy_lstm(obs_size: usize, hidden: usize, lstm_hidden: usize, n_actions: usize) -> Self {
        Self::new()
            .with_param("net.0.weight", &[hidden, obs_size])
            .with_param("net.0.bias", &[hidden])
            .with_param("net.2.weight", &[hidden, hidden])
            .with_param("net.2.bias", &[hidden])
            .with_param("lstm.weight_ih_l0", &[4 * lstm_hidden, hidden])
            .with_param("lstm.weight_hh_l0", &[4 * lstm_hidden, lstm_hidden])
            .with_param("lstm.bias_ih_l0", &[4 * lstm_hidden])
            .with_param("lstm.bias_hh_l0", &[4 * lstm_hidden])
            .with_param("action_head.weight", &[n_actions, lstm_hidden])
            .with_param("action_head.bias", &[n_actions])
            .with_param("value_head.weight", &[1, lstm_hidden])
            .with_param("value_head.bias", &[1])
    }
}

/// Load a policy snapshot for fine-tuning continuation.
///
/// Strips any distributed-training prefix from parameter keys, then checks
/// the snapshot against `spec` exactly: same names, same shapes, element
/// counts consistent with the shapes.
pub fn load_checkpoint(
    path: &Path,
    device: Device,
    spec: &PolicySpec,
) -> Result<PolicyState, CheckpointError> {
    if !path.is_file() {
        return Err(CheckpointError::NotFound(path.to_path_buf()));
    }

    let raw = fs::read_to_string(path)?;
    let parameters: BTreeMap<String, ParamTensor> =
        serde_json::from_str(&raw).map_err(|e| CheckpointError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    // Strip the wrapper prefix before matching against the target policy.
    let mut stripped = BTreeMap::new();
    for (name, tensor) in parameters {
        let name = name
            .strip_prefix(DISTRIBUTED_PREFIX)
            .map(str::to_string)
            .unwrap_or(name);
        stripped.insert(name, tensor);
    }

    for (name, shape) in &spec.shapes {
        let tensor = stripped.get(name).ok_or_else(|| {
            CheckpointError::Mismatch(format!("missing parameter '{}'", name))
        })?;
        if &tensor.shape != shape {
            return Err(CheckpointError::Mismatch(format!(
                "parameter '{}' has shape {:?}, expected {:?}",
                name, tensor.shape, shape
            )));
        }
        if tensor.data.len() != tensor.numel() {
            return Err(CheckpointError::Mismatch(format!(
                "parameter '{}' carries {} elements for shape {:?}",
                name,
                tensor.data.len(),
                tensor.shape
            )));
        }
    }
    if let Some(extra) = stripped.keys().find(|name| !spec.shapes.contains_key(*name)) {
        return Err(CheckpointError::Mismatch(format!(
            "unexpected parameter '{}'",
            extra
        )));
    }

    Ok(PolicyState {
        parameters: stripped,
        device,
    })
}

/// Serialize a policy snapshot to a checkpoint file, creating parent
/// directories as needed.
pub fn save_policy_state(state: &PolicyState, path: &Path) -> Result<(), CheckpointError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string(&state.parameters).map_err(|e| CheckpointError::Malformed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    fs::write(path, json)?;
    Ok(())
}

/// Find the most recently written `model_*.json` checkpoint under a run
/// directory, if any.
pub fn latest_checkpoint(dir: &Path) -> Option<PathBuf> {
    let mut newest: Option<(std::time::SystemTime, PathBuf)> = None;
    for entry in fs::read_dir(dir).ok()?.flatten() {
        let path = entry.path();
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        if !path.is_file() || !name.starts_with("model_") || !name.ends_with(".json") {
            continue;
        }
        // An entry that fails to stat is skipped, not fatal to the scan.
        let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
            continue;
        };
        match &newest {
            Some((best, _)) if *best >= modified => {}
            _ => newest = Some((modified, path)),
        }
    }
    newest.map(|(_, path)| path)
}
