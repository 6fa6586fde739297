use crate::config::ExperimentConfig;

/// Dwell times of one trial, fixed when the trial is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialSchedule {
    pub fixation_ms: u64,
    pub exposure_ms: u64,
    pub response_window_ms: u64,
}

impl From<&ExperimentConfig> for TrialSchedule {
    fn from(config: &ExperimentConfig) -> Self {
        Self {
            fixation_ms: config.fixation_ms,
            exposure_ms: config.exposure_ms,
            response_window_ms: config.response_window_ms,
        }
    }
}

/// Clock readings (ns) at each phase onset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrialTimestamps {
    pub fixation: Option<u64>,
    pub exposure: Option<u64>,
    pub response_open: Option<u64>,
    pub response: Option<u64>,
}
