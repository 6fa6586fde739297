use crate::error::{ExperimentError, Result};
use serde::{Deserialize, Serialize};

/// When the fixation marker is signalled to the recording hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixationTrigger {
    /// As the cross appears.
    Onset,
    /// When the fixation dwell ends, just before the stimulus.
    Offset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub fixation_ms: u64,
    pub exposure_ms: u64,
    pub response_window_ms: u64,
    /// Inclusive range the inter-trial blank is drawn from.
    pub iti_range_ms: (u64, u64),
    /// Blank screen before the first trial of a block.
    pub block_lead_in_ms: u64,
    /// Images drawn from each emotion pool per congruency condition.
    pub images_per_bucket: usize,
    pub fixation_trigger: FixationTrigger,
    /// Enables the phase-skip key.
    pub debug: bool,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            fixation_ms: 1000,
            exposure_ms: 200,
            response_window_ms: 1000,
            iti_range_ms: (1000, 1200),
            block_lead_in_ms: 500,
            images_per_bucket: 60,
            fixation_trigger: FixationTrigger::Onset,
            debug: false,
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        let (lo, hi) = self.iti_range_ms;
        if lo > hi {
            return Err(ExperimentError::Config(format!(
                "iti_range_ms lower bound {lo} exceeds upper bound {hi}"
            )));
        }
        if self.response_window_ms == 0 {
            return Err(ExperimentError::Config(
                "response_window_ms must be positive".into(),
            ));
        }
        if self.images_per_bucket == 0 {
            return Err(ExperimentError::Config(
                "images_per_bucket must be positive".into(),
            ));
        }
        Ok(())
    }
}
