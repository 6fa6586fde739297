use crate::context::Context;
use crate::error::{ExperimentError, Result};
use crate::log::TrialLog;
use crate::runner::BlockRunner;
use crate::slides;
use emostroop_core::{
    Block, BlockRole, Emotion, InputEvent, ParticipantId, Screen, SessionPhase, Slide, Trial,
    Trigger,
};
use emostroop_timing::Scheduler;
use emostroop_trigger::TriggerSink;
use rand::Rng;
use std::io::{self, BufRead, Write};
use tracing::{info, warn};

pub const PROMPT: &str = "Ingrese el ID del participante y presione ENTER para iniciar: ";
pub const REJECTED: &str = "ID ingresado no cumple con las condiciones, contacte con el encargado...";

/// Reads participant IDs from `input` until one parses.
///
/// Returns `None` when `input` is exhausted before a valid ID is entered.
pub fn prompt_participant<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
) -> io::Result<Option<ParticipantId>> {
    let mut line = String::new();
    loop {
        write!(output, "{PROMPT}")?;
        output.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        match line.parse::<ParticipantId>() {
            Ok(id) => {
                log_mapping(&id);
                return Ok(Some(id));
            }
            Err(e) => {
                warn!("Rejected participant ID {:?}: {}", line.trim(), e);
                writeln!(output, "{REJECTED}")?;
            }
        }
    }
}

/// Logs the response keys and block order encoded in `id`.
pub fn log_mapping(id: &ParticipantId) {
    let keymap = id.keymap();
    info!(
        "Participant {}: happy on [{}], sad on [{}], blocks {} then {}",
        id.code(),
        keymap.key_for(Emotion::Happy).label(),
        keymap.key_for(Emotion::Sad).label(),
        id.first_block().label(),
        id.second_block().label()
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionOutcome {
    #[default]
    Completed,
    Aborted,
}

/// Trials collected for one block. Partial when the session was aborted
/// inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockResult {
    pub index: u8,
    pub role: BlockRole,
    pub trials: Vec<Trial>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub blocks: Vec<BlockResult>,
}

impl SessionReport {
    pub fn trials(&self) -> impl Iterator<Item = &Trial> {
        self.blocks.iter().flat_map(|b| b.trials.iter())
    }
}

/// One participant's run through welcome, both blocks and the farewell.
pub struct Session<L: TrialLog> {
    participant: ParticipantId,
    blocks: [Block; 2],
    log: L,
}

impl<L: TrialLog> Session<L> {
    pub fn new(participant: ParticipantId, blocks: [Block; 2], log: L) -> Self {
        Self {
            participant,
            blocks,
            log,
        }
    }

    pub fn participant(&self) -> &ParticipantId {
        &self.participant
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn into_log(self) -> L {
        self.log
    }

    /// Runs the whole session and tears it down.
    ///
    /// An operator abort is reported as [`SessionOutcome::Aborted`]. The
    /// stop trigger is sent and the log flushed before the display and
    /// trigger channel are released, whatever the outcome.
    pub fn run<S, D, T, R>(&mut self, ctx: &mut Context<S, D, T, R>) -> Result<SessionReport>
    where
        S: Scheduler<Event = InputEvent>,
        D: Screen,
        T: TriggerSink,
        R: Rng,
    {
        info!("Session started for {}", self.participant);
        let mut report = SessionReport::default();

        ctx.emit(Trigger::SessionStart);
        let result = self.run_phases(ctx, &mut report);
        ctx.emit(Trigger::SessionStop);

        let flushed = self.log.flush();
        ctx.release();

        match result {
            Ok(()) => {
                flushed?;
                report.outcome = SessionOutcome::Completed;
                info!("Session completed, {} trials", report.trials().count());
            }
            Err(ExperimentError::Aborted) => {
                if let Err(e) = flushed {
                    warn!("Failed to flush session log after abort: {}", e);
                }
                report.outcome = SessionOutcome::Aborted;
                info!("Session aborted after {} trials", report.trials().count());
            }
            Err(e) => return Err(e),
        }
        Ok(report)
    }

    fn run_phases<S, D, T, R>(
        &mut self,
        ctx: &mut Context<S, D, T, R>,
        report: &mut SessionReport,
    ) -> Result<()>
    where
        S: Scheduler<Event = InputEvent>,
        D: Screen,
        T: TriggerSink,
        R: Rng,
    {
        let mut phase = Some(SessionPhase::default());
        let mut finished_block = 0;

        while let Some(current) = phase {
            info!("Session phase: {:?}", current);
            match current {
                SessionPhase::Welcome => show(ctx, &slides::welcome())?,
                SessionPhase::Instructions(n) => {
                    let role = self.blocks[usize::from(n - 1)].role();
                    let keymap = ctx.keymap();
                    show(ctx, &slides::instructions(role, n, keymap))?;
                }
                SessionPhase::Block(n) => {
                    let block = &self.blocks[usize::from(n - 1)];
                    let mut runner = BlockRunner::new(self.participant.code(), &mut self.log);
                    let outcome = runner.run(ctx, block);
                    let trials = match outcome {
                        Ok(trials) => trials,
                        Err(e) => {
                            report.blocks.push(BlockResult {
                                index: block.index(),
                                role: block.role(),
                                trials: runner.into_completed(),
                            });
                            return Err(e);
                        }
                    };
                    report.blocks.push(BlockResult {
                        index: block.index(),
                        role: block.role(),
                        trials,
                    });
                    finished_block = n;
                }
                SessionPhase::Rest => show(ctx, &slides::rest(finished_block))?,
                SessionPhase::Farewell => show(ctx, &slides::farewell())?,
            }
            phase = current.next();
        }
        Ok(())
    }
}

fn show<S, D, T, R>(ctx: &mut Context<S, D, T, R>, slide: &Slide) -> Result<()>
where
    S: Scheduler<Event = InputEvent>,
    D: Screen,
    T: TriggerSink,
    R: Rng,
{
    ctx.screen.slide(slide);
    ctx.wait_for_space()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExperimentConfig;
    use crate::log::CsvLog;
    use crate::sim::{FailingSink, RecordingScreen, ScreenCall, SimScheduler};
    use emostroop_core::{Answer, Key, KeyMap, Stimulus};
    use emostroop_trigger::RecordingSink;
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn blocks() -> [Block; 2] {
        [
            Block::new(
                1,
                BlockRole::FaceIdentification,
                vec![
                    Stimulus::new("Happy/H1.jpg", Emotion::Happy, Emotion::Happy),
                    Stimulus::new("Sad/S1.jpg", Emotion::Sad, Emotion::Happy),
                ],
            ),
            Block::new(
                2,
                BlockRole::WordIdentification,
                vec![
                    Stimulus::new("Sad/S2.jpg", Emotion::Sad, Emotion::Happy),
                    Stimulus::new("Happy/H2.jpg", Emotion::Happy, Emotion::Sad),
                ],
            ),
        ]
    }

    fn context(keys: &[(u64, Key)]) -> Context<SimScheduler, RecordingScreen, RecordingSink, StdRng> {
        Context::new(
            SimScheduler::with_keys(keys),
            RecordingScreen::default(),
            RecordingSink::new(),
            StdRng::seed_from_u64(3),
            ExperimentConfig {
                iti_range_ms: (1000, 1000),
                ..Default::default()
            },
            KeyMap::HappyOnV,
        )
    }

    fn participant() -> ParticipantId {
        "4321_F_C".parse().unwrap()
    }

    #[test]
    fn full_session_walks_every_phase() {
        // Block 1 opens at 1 ms: response window 1701..2701, then a
        // 1000 ms blank and a missed second trial ending at 5200.
        // Block 2 opens at 10001: first trial missed, second window
        // 14901..15901 answered at 15000.
        let keys = [
            (0, Key::Space),
            (1, Key::Space),
            (2000, Key::V),
            (10_000, Key::Space),
            (10_001, Key::Space),
            (15_000, Key::N),
            (20_000, Key::Space),
        ];
        let mut ctx = context(&keys);
        let mut session = Session::new(participant(), blocks(), CsvLog::new(Vec::new()).unwrap());

        let report = session.run(&mut ctx).unwrap();

        assert_eq!(report.outcome, SessionOutcome::Completed);
        let answers: Vec<_> = report
            .trials()
            .map(|t| (t.stimulus.image_id(), t.answer, t.rt_ms, t.is_correct()))
            .collect();
        assert_eq!(
            answers,
            vec![
                ("H1".to_string(), Answer::Happy, 299, Some(true)),
                ("S1".to_string(), Answer::Missed, 1000, None),
                ("S2".to_string(), Answer::Missed, 1000, None),
                ("H2".to_string(), Answer::Sad, 99, Some(true)),
            ]
        );
        assert_eq!(
            ctx.triggers.codes(),
            vec![254, 51, 1, 11, 100, 1, 22, 250, 52, 1, 22, 250, 1, 21, 100, 255]
        );

        let slides: Vec<_> = ctx
            .screen
            .calls
            .iter()
            .filter_map(|c| match c {
                ScreenCall::Slide(first) => Some(first.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(
            slides,
            vec![
                "Bienvenido/a, a este experimento!!!",
                "Ahora comenzaremos con el experimento.",
                "Fin del bloque 1.",
                "Ahora comenzaremos con el experimento.",
                "La tarea ha finalizado.",
            ]
        );
        assert_eq!(ctx.scheduler.remaining(), 0);
        assert!(ctx.screen.closed);
        assert!(ctx.triggers.is_closed());
        assert_eq!(session.log().records(), 4);
    }

    #[test]
    fn abort_stops_cleanly_and_keeps_partial_block() {
        let keys = [(0, Key::Space), (1, Key::Space), (800, Key::Escape)];
        let mut ctx = context(&keys);
        let mut session = Session::new(participant(), blocks(), CsvLog::new(Vec::new()).unwrap());

        let report = session.run(&mut ctx).unwrap();

        assert_eq!(report.outcome, SessionOutcome::Aborted);
        assert_eq!(report.blocks.len(), 1);
        assert!(report.blocks[0].trials.is_empty());
        assert_eq!(ctx.triggers.codes(), vec![254, 51, 1, 255]);
        assert!(ctx.screen.closed);
        assert!(ctx.triggers.is_closed());

        let text = String::from_utf8(session.into_log().into_inner().unwrap()).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn session_completes_when_every_trigger_fails() {
        let keys = [
            (0, Key::Space),
            (1, Key::Space),
            (2000, Key::V),
            (10_000, Key::Space),
            (10_001, Key::Space),
            (15_000, Key::N),
            (20_000, Key::Space),
        ];
        let mut ctx = Context::new(
            SimScheduler::with_keys(&keys),
            RecordingScreen::default(),
            FailingSink::default(),
            StdRng::seed_from_u64(3),
            ExperimentConfig {
                iti_range_ms: (1000, 1000),
                ..Default::default()
            },
            KeyMap::HappyOnV,
        );
        let mut session = Session::new(participant(), blocks(), CsvLog::new(Vec::new()).unwrap());

        let report = session.run(&mut ctx).unwrap();

        assert_eq!(report.outcome, SessionOutcome::Completed);
        assert_eq!(report.trials().count(), 4);
        assert_eq!(session.log().records(), 4);
        assert_eq!(ctx.failed_triggers(), 16);
        assert!(ctx.screen.closed);
    }

    #[test]
    fn abort_on_welcome_sends_start_and_stop_only() {
        let mut ctx = context(&[(5, Key::Escape)]);
        let mut session = Session::new(participant(), blocks(), CsvLog::new(Vec::new()).unwrap());
        let report = session.run(&mut ctx).unwrap();
        assert_eq!(report.outcome, SessionOutcome::Aborted);
        assert!(report.blocks.is_empty());
        assert_eq!(ctx.triggers.codes(), vec![254, 255]);
    }

    #[test]
    fn prompt_repeats_until_valid() {
        let mut out = Vec::new();
        let id = prompt_participant("abc\n4321_F_C\n".as_bytes(), &mut out)
            .unwrap()
            .unwrap();
        assert_eq!(id.code(), "4321");

        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(PROMPT).count(), 2);
        assert_eq!(text.matches(REJECTED).count(), 1);
    }

    #[test]
    fn prompt_rejects_ids_unusable_as_file_names() {
        let mut out = Vec::new();
        let id = prompt_participant("a/b_F_C\n7|1_T_P\n71_T_P\n".as_bytes(), &mut out)
            .unwrap()
            .unwrap();
        assert_eq!(id.raw(), "71_T_P");
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches(REJECTED).count(), 2);
    }

    #[test]
    fn prompt_gives_up_at_end_of_input() {
        let mut out = Vec::new();
        let id = prompt_participant("abc\n".as_bytes(), &mut out).unwrap();
        assert_eq!(id, None);
    }
}
