use crate::error::Result;
use crate::log::TIMESTAMP_FORMAT;
use crate::session::{BlockResult, SessionOutcome, SessionReport};
use chrono::{DateTime, Utc};
use emostroop_core::{BlockRole, ParticipantId};
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;

/// Per-block descriptive statistics. Reaction times cover answered
/// trials only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlockSummary {
    pub index: u8,
    pub role: BlockRole,
    pub trials: usize,
    pub answered: usize,
    pub correct: usize,
    pub missed: usize,
    /// Correct answers over all presented trials.
    pub accuracy: f64,
    pub mean_rt_ms: Option<f64>,
    pub min_rt_ms: Option<u64>,
    pub max_rt_ms: Option<u64>,
}

impl BlockSummary {
    pub fn from_result(result: &BlockResult) -> Self {
        let times: Vec<u64> = result
            .trials
            .iter()
            .filter(|t| !t.is_missed())
            .map(|t| t.rt_ms)
            .collect();
        let correct = result
            .trials
            .iter()
            .filter(|t| t.is_correct() == Some(true))
            .count();
        let trials = result.trials.len();

        let accuracy = if trials == 0 {
            0.0
        } else {
            correct as f64 / trials as f64
        };
        let mean_rt_ms = if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<u64>() as f64 / times.len() as f64)
        };

        Self {
            index: result.index,
            role: result.role,
            trials,
            answered: times.len(),
            correct,
            missed: trials - times.len(),
            accuracy,
            mean_rt_ms,
            min_rt_ms: times.iter().copied().min(),
            max_rt_ms: times.iter().copied().max(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub participant: String,
    pub started: DateTime<Utc>,
    pub completed: bool,
    pub blocks: Vec<BlockSummary>,
}

impl SessionSummary {
    pub fn new(participant: &ParticipantId, started: DateTime<Utc>, report: &SessionReport) -> Self {
        Self {
            participant: participant.raw().to_string(),
            started,
            completed: report.outcome == SessionOutcome::Completed,
            blocks: report.blocks.iter().map(BlockSummary::from_result).collect(),
        }
    }

    pub fn log(&self) {
        for block in &self.blocks {
            info!(
                "Block {} ({}): {} trials, accuracy {:.1}%, {} missed, mean RT {}",
                block.index,
                block.role.label(),
                block.trials,
                block.accuracy * 100.0,
                block.missed,
                block
                    .mean_rt_ms
                    .map_or_else(|| "n/a".to_string(), |rt| format!("{rt:.1} ms"))
            );
        }
    }

    /// Writes `{timestamp}_{participant}_summary.json` next to the session log.
    pub fn write(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "{}_{}_summary.json",
            self.started.format(TIMESTAMP_FORMAT),
            self.participant
        ));
        let file = BufWriter::new(File::create(&path)?);
        serde_json::to_writer_pretty(file, self)?;
        info!("Summary saved to {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use emostroop_core::{Answer, Emotion, Stimulus, Trial};
    use pretty_assertions::assert_eq;

    fn trial(answer: Answer, rt_ms: u64, truth: Emotion) -> Trial {
        let stim = Stimulus::new("Happy/H1.jpg", Emotion::Happy, Emotion::Sad);
        Trial::scored(stim, rt_ms, answer, truth)
    }

    fn report() -> SessionReport {
        SessionReport {
            outcome: SessionOutcome::Aborted,
            blocks: vec![BlockResult {
                index: 1,
                role: BlockRole::FaceIdentification,
                trials: vec![
                    trial(Answer::Happy, 400, Emotion::Happy),
                    trial(Answer::Sad, 600, Emotion::Happy),
                    trial(Answer::Missed, 1000, Emotion::Happy),
                    trial(Answer::Happy, 500, Emotion::Happy),
                ],
            }],
        }
    }

    #[test]
    fn statistics_ignore_missed_trials() {
        let summary = BlockSummary::from_result(&report().blocks[0]);
        assert_eq!(summary.trials, 4);
        assert_eq!(summary.answered, 3);
        assert_eq!(summary.correct, 2);
        assert_eq!(summary.missed, 1);
        assert_eq!(summary.accuracy, 0.5);
        assert_eq!(summary.mean_rt_ms, Some(500.0));
        assert_eq!(summary.min_rt_ms, Some(400));
        assert_eq!(summary.max_rt_ms, Some(600));
    }

    #[test]
    fn empty_block_has_no_reaction_times() {
        let empty = BlockResult {
            index: 2,
            role: BlockRole::WordIdentification,
            trials: Vec::new(),
        };
        let summary = BlockSummary::from_result(&empty);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.mean_rt_ms, None);
        assert_eq!(summary.min_rt_ms, None);
    }

    #[test]
    fn writes_json_next_to_log() {
        let tmp = tempfile::tempdir().unwrap();
        let id: ParticipantId = "12_T_P".parse().unwrap();
        let started = Utc.with_ymd_and_hms(2024, 1, 9, 8, 0, 0).unwrap();

        let summary = SessionSummary::new(&id, started, &report());
        let path = summary.write(tmp.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "2024-01-09_08-00-00_12_T_P_summary.json"
        );

        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["participant"], "12_T_P");
        assert_eq!(json["completed"], false);
        assert_eq!(json["blocks"][0]["missed"], 1);
        assert_eq!(json["blocks"][0]["role"], "FaceIdentification");
    }
}
