use std::path::Path;

use hapdir_transport::Encoding;
use serde::{Deserialize, Serialize};

use crate::design::TrialDesign;
use crate::error::ExperimentError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Hold between trial start and stimulus onset; responses are refused.
    pub pre_stimulus_delay_ms: u64,
    /// How long the "stimulus active" indicator stays on. Cosmetic.
    pub stimulus_active_ms: u64,
    /// Largest circular error still counted as correct.
    pub correct_threshold_deg: f64,
    /// Ask for clarity/confidence ratings after every trial.
    pub collect_ratings: bool,
    pub design: TrialDesign,
    pub encoding: Encoding,
    /// Fixes the trial order; drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            pre_stimulus_delay_ms: 3000,
            stimulus_active_ms: 3000,
            correct_threshold_deg: 30.0,
            collect_ratings: true,
            design: TrialDesign::default(),
            encoding: Encoding::Direct,
            seed: None,
        }
    }
}

impl ExperimentConfig {
    pub fn from_json_str(text: &str) -> Result<Self, ExperimentError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ExperimentError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
