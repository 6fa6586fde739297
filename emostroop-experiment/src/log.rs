use crate::error::{ExperimentError, Result};
use chrono::{DateTime, Utc};
use emostroop_core::{Block, ParticipantId, Trial};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Column names of the session log, in order.
pub const HEADER: [&str; 9] = [
    "Sujeto",
    "IdImagen",
    "Bloque",
    "TReaccion",
    "TipoImagen",
    "Palabra",
    "TipoRespuesta",
    "Respuesta",
    "Acierto",
];

/// Timestamp prefix used for session artifacts.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// One line of the session log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogRecord {
    pub participant: String,
    pub image_id: String,
    pub block: u8,
    pub rt_ms: u64,
    pub image_emotion: &'static str,
    pub word_emotion: &'static str,
    pub role: &'static str,
    pub answer: &'static str,
    /// 1/0, or empty for missed trials.
    pub correct: Option<u8>,
}

impl LogRecord {
    pub fn new(participant: &str, block: &Block, trial: &Trial) -> Self {
        Self {
            participant: participant.to_string(),
            image_id: trial.stimulus.image_id(),
            block: block.index(),
            rt_ms: trial.rt_ms,
            image_emotion: trial.stimulus.face().label(),
            word_emotion: trial.stimulus.word().label(),
            role: block.role().label(),
            answer: trial.answer.label(),
            correct: trial.is_correct().map(u8::from),
        }
    }
}

/// Append-only sink for completed trials.
pub trait TrialLog {
    fn append(&mut self, record: &LogRecord) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
}

/// CSV session log. Every record is flushed as soon as it is written.
pub struct CsvLog<W: Write> {
    writer: csv::Writer<W>,
    records: usize,
}

impl<W: Write> CsvLog<W> {
    pub fn new(inner: W) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(inner);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(Self { writer, records: 0 })
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer.into_inner().map_err(|e| {
            ExperimentError::Io(io::Error::new(e.error().kind(), e.error().to_string()))
        })
    }
}

impl CsvLog<File> {
    /// Creates `{timestamp}_{participant}.csv` in `dir`, creating `dir` if needed.
    pub fn create(
        dir: &Path,
        participant: &ParticipantId,
        started: DateTime<Utc>,
    ) -> Result<(Self, PathBuf)> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!(
            "{}_{}.csv",
            started.format(TIMESTAMP_FORMAT),
            participant.raw()
        ));
        let log = Self::new(File::create(&path)?)?;
        info!("Session log created: {}", path.display());
        Ok((log, path))
    }
}

impl<W: Write> TrialLog for CsvLog<W> {
    fn append(&mut self, record: &LogRecord) -> Result<()> {
        self.writer.serialize(record)?;
        self.writer.flush()?;
        self.records += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use emostroop_core::{Answer, BlockRole, Emotion, Stimulus};
    use pretty_assertions::assert_eq;

    fn block(role: BlockRole) -> Block {
        Block::new(2, role, Vec::new())
    }

    #[test]
    fn writes_header_then_streamed_rows() {
        let stim = Stimulus::new("media/images/Sad/SF07.jpg", Emotion::Sad, Emotion::Happy);
        let answered = Trial::scored(stim.clone(), 532, Answer::Sad, Emotion::Sad);
        let missed = Trial::scored(stim, 1000, Answer::Missed, Emotion::Happy);

        let mut log = CsvLog::new(Vec::new()).unwrap();
        let b = block(BlockRole::FaceIdentification);
        log.append(&LogRecord::new("4321", &b, &answered)).unwrap();
        log.append(&LogRecord::new("4321", &b, &missed)).unwrap();
        assert_eq!(log.records(), 2);

        let text = String::from_utf8(log.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "Sujeto,IdImagen,Bloque,TReaccion,TipoImagen,Palabra,TipoRespuesta,Respuesta,Acierto\n\
             4321,SF07,2,532,Sad,Happy,Cara,Sad,1\n\
             4321,SF07,2,1000,Sad,Happy,Cara,Missed,\n"
        );
    }

    #[test]
    fn incorrect_answers_log_zero() {
        let stim = Stimulus::new("Happy/HF01.png", Emotion::Happy, Emotion::Sad);
        let trial = Trial::scored(stim, 410, Answer::Happy, Emotion::Sad);
        let record = LogRecord::new("7", &block(BlockRole::WordIdentification), &trial);
        assert_eq!(record.correct, Some(0));
        assert_eq!(record.role, "Palabra");
    }

    #[test]
    fn creates_timestamped_file_in_new_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("data");
        let id: ParticipantId = "4321_F_C".parse().unwrap();
        let started = Utc.with_ymd_and_hms(2024, 5, 2, 14, 3, 9).unwrap();

        let (log, path) = CsvLog::create(&dir, &id, started).unwrap();
        drop(log);
        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "2024-05-02_14-03-09_4321_F_C.csv"
        );
        let text = fs::read_to_string(path).unwrap();
        assert!(text.starts_with("Sujeto,IdImagen"));
    }
}
