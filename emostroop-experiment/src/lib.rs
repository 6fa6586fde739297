pub mod assets;
pub mod config;
pub mod context;
pub mod error;
pub mod log;
pub mod runner;
pub mod session;
pub mod slides;
pub mod state;
pub mod summary;
pub mod trial;

#[cfg(test)]
mod sim;

pub use assets::{ImagePools, assemble_blocks, congruency_buckets};
pub use config::{ExperimentConfig, FixationTrigger};
pub use context::{Context, PhaseEnd};
pub use error::{ExperimentError, Result};
pub use log::{CsvLog, HEADER, LogRecord, TrialLog};
pub use runner::BlockRunner;
pub use session::{
    BlockResult, Session, SessionOutcome, SessionReport, log_mapping, prompt_participant,
};
pub use state::TrialSequencer;
pub use summary::{BlockSummary, SessionSummary};
pub use trial::{TrialSchedule, TrialTimestamps};
