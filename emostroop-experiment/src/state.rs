use crate::config::FixationTrigger;
use crate::context::{Context, PhaseEnd};
use crate::error::Result;
use crate::trial::{TrialSchedule, TrialTimestamps};
use emostroop_core::{
    Answer, BlockRole, InputEvent, Key, ResponseKey, Screen, Stimulus, Trial, TrialState, Trigger,
};
use emostroop_timing::Scheduler;
use emostroop_trigger::TriggerSink;
use rand::Rng;
use tracing::{debug, warn};

const NS_PER_MS: u64 = 1_000_000;

/// Drives one stimulus through fixation, exposure and response collection.
///
/// Triggers leave in a fixed order: fixation, condition, then exactly one
/// outcome code.
pub struct TrialSequencer<'a> {
    stimulus: &'a Stimulus,
    role: BlockRole,
    schedule: TrialSchedule,
    state: TrialState,
    timestamps: TrialTimestamps,
}

impl<'a> TrialSequencer<'a> {
    pub fn new(stimulus: &'a Stimulus, role: BlockRole, schedule: TrialSchedule) -> Self {
        Self {
            stimulus,
            role,
            schedule,
            state: TrialState::Fixation,
            timestamps: TrialTimestamps::default(),
        }
    }

    pub fn state(&self) -> TrialState {
        self.state
    }

    pub fn timestamps(&self) -> &TrialTimestamps {
        &self.timestamps
    }

    /// Runs the trial to completion.
    pub fn run<S, D, T, R>(mut self, ctx: &mut Context<S, D, T, R>) -> Result<Trial>
    where
        S: Scheduler<Event = InputEvent>,
        D: Screen,
        T: TriggerSink,
        R: Rng,
    {
        loop {
            if let Some(trial) = self.step(ctx)? {
                return Ok(trial);
            }
        }
    }

    /// Executes the current phase and advances. Returns the finished trial
    /// once the response phase is done.
    pub fn step<S, D, T, R>(&mut self, ctx: &mut Context<S, D, T, R>) -> Result<Option<Trial>>
    where
        S: Scheduler<Event = InputEvent>,
        D: Screen,
        T: TriggerSink,
        R: Rng,
    {
        let finished = match self.state {
            TrialState::Fixation => {
                self.fixation(ctx)?;
                None
            }
            TrialState::Exposure => {
                self.exposure(ctx)?;
                None
            }
            TrialState::ResponseWait => Some(self.response_wait(ctx)?),
            TrialState::Complete => None,
        };
        self.state = self.state.next();
        Ok(finished)
    }

    fn fixation<S, D, T, R>(&mut self, ctx: &mut Context<S, D, T, R>) -> Result<()>
    where
        S: Scheduler<Event = InputEvent>,
        D: Screen,
        T: TriggerSink,
        R: Rng,
    {
        ctx.screen.fixation();
        let onset = ctx.scheduler.now();
        self.timestamps.fixation = Some(onset);
        let deadline = onset + self.schedule.fixation_ms * NS_PER_MS;

        if ctx.config.fixation_trigger == FixationTrigger::Onset {
            ctx.emit(Trigger::Fixation);
        }
        // Decode while the cross is up so exposure onset is not delayed.
        if let Err(e) = ctx.screen.prepare(self.stimulus) {
            warn!("Stimulus image unavailable, showing word only: {}", e);
        }
        ctx.wait(Some(deadline), |_| false)?;
        if ctx.config.fixation_trigger == FixationTrigger::Offset {
            ctx.emit(Trigger::Fixation);
        }
        Ok(())
    }

    fn exposure<S, D, T, R>(&mut self, ctx: &mut Context<S, D, T, R>) -> Result<()>
    where
        S: Scheduler<Event = InputEvent>,
        D: Screen,
        T: TriggerSink,
        R: Rng,
    {
        ctx.screen.stimulus(self.stimulus);
        let onset = ctx.scheduler.now();
        self.timestamps.exposure = Some(onset);
        let deadline = onset + self.schedule.exposure_ms * NS_PER_MS;

        ctx.emit(Trigger::condition(self.stimulus.face(), self.stimulus.word()));
        ctx.wait(Some(deadline), |_| false)?;
        Ok(())
    }

    fn response_wait<S, D, T, R>(&mut self, ctx: &mut Context<S, D, T, R>) -> Result<Trial>
    where
        S: Scheduler<Event = InputEvent>,
        D: Screen,
        T: TriggerSink,
        R: Rng,
    {
        let opened = ctx.scheduler.now();
        self.timestamps.response_open = Some(opened);
        let deadline = opened + self.schedule.response_window_ms * NS_PER_MS;

        let end = ctx.wait(Some(deadline), |k| matches!(k, Key::V | Key::N))?;
        let (answer, answered_at) = match end {
            PhaseEnd::Key { key, timestamp_ns } => {
                let response_key = if key == Key::V {
                    ResponseKey::V
                } else {
                    ResponseKey::N
                };
                self.timestamps.response = Some(timestamp_ns);
                (Answer::from(ctx.keymap().emotion_for(response_key)), timestamp_ns)
            }
            PhaseEnd::Elapsed | PhaseEnd::Skipped => (Answer::Missed, ctx.scheduler.now()),
        };
        let rt_ms = answered_at.saturating_sub(opened) / NS_PER_MS;

        let truth = self.role.ground_truth(self.stimulus);
        let trial = Trial::scored(self.stimulus.clone(), rt_ms, answer, truth);
        ctx.emit(Trigger::outcome(trial.answer, trial.is_correct()));

        debug!(
            "Trial {}: answer {} (truth {}), RT = {} ms",
            self.stimulus.image_id(),
            trial.answer,
            truth,
            rt_ms
        );
        Ok(trial)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExperimentConfig;
    use crate::sim::{RecordingScreen, ScreenCall, SimScheduler, ms};
    use emostroop_core::{Emotion, KeyMap};
    use emostroop_trigger::RecordingSink;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    type SimContext = Context<SimScheduler, RecordingScreen, RecordingSink, StdRng>;

    fn context(keys: &[(u64, Key)], config: ExperimentConfig) -> SimContext {
        context_with_keymap(keys, config, KeyMap::HappyOnV)
    }

    fn context_with_keymap(keys: &[(u64, Key)], config: ExperimentConfig, keymap: KeyMap) -> SimContext {
        Context::new(
            SimScheduler::with_keys(keys),
            RecordingScreen::default(),
            RecordingSink::new(),
            StdRng::seed_from_u64(1),
            config,
            keymap,
        )
    }

    fn happy_face_sad_word() -> Stimulus {
        Stimulus::new("media/images/Happy/HF01.jpg", Emotion::Happy, Emotion::Sad)
    }

    fn run(ctx: &mut SimContext, role: BlockRole) -> Result<Trial> {
        let stim = happy_face_sad_word();
        TrialSequencer::new(&stim, role, TrialSchedule::from(&ctx.config)).run(ctx)
    }

    // Defaults: response window opens 1200 ms after fixation onset.

    #[test]
    fn face_block_scores_against_the_face() {
        let mut ctx = context(&[(1500, Key::V)], ExperimentConfig::default());
        let trial = run(&mut ctx, BlockRole::FaceIdentification).unwrap();
        assert_eq!(trial.answer, Answer::Happy);
        assert_eq!(trial.is_correct(), Some(true));
        assert_eq!(trial.rt_ms, 300);
        assert_eq!(ctx.triggers.codes(), vec![1, 21, 100]);
    }

    #[test]
    fn word_block_scores_against_the_word() {
        let mut ctx = context(&[(1500, Key::V)], ExperimentConfig::default());
        let trial = run(&mut ctx, BlockRole::WordIdentification).unwrap();
        assert_eq!(trial.answer, Answer::Happy);
        assert_eq!(trial.is_correct(), Some(false));
        assert_eq!(ctx.triggers.codes(), vec![1, 21, 200]);
    }

    #[test]
    fn no_key_is_a_miss() {
        let mut ctx = context(&[], ExperimentConfig::default());
        let trial = run(&mut ctx, BlockRole::FaceIdentification).unwrap();
        assert_eq!(trial.answer, Answer::Missed);
        assert_eq!(trial.is_correct(), None);
        assert_eq!(trial.rt_ms, 1000);
        assert_eq!(ctx.triggers.codes(), vec![1, 21, 250]);
    }

    #[test]
    fn key_queued_at_the_deadline_wins_over_timeout() {
        let mut ctx = context(&[(2200, Key::N)], ExperimentConfig::default());
        let trial = run(&mut ctx, BlockRole::FaceIdentification).unwrap();
        assert_eq!(trial.answer, Answer::Sad);
        assert_eq!(trial.rt_ms, 1000);
        assert_eq!(ctx.triggers.codes(), vec![1, 21, 200]);
    }

    #[test]
    fn key_after_the_deadline_is_missed() {
        let mut ctx = context(&[(2201, Key::V)], ExperimentConfig::default());
        let trial = run(&mut ctx, BlockRole::FaceIdentification).unwrap();
        assert_eq!(trial.answer, Answer::Missed);
    }

    #[test]
    fn keys_before_the_response_window_are_ignored() {
        let mut ctx = context(
            &[(500, Key::V), (1100, Key::N), (1250, Key::N)],
            ExperimentConfig::default(),
        );
        let trial = run(&mut ctx, BlockRole::FaceIdentification).unwrap();
        assert_eq!(trial.answer, Answer::Sad);
        assert_eq!(trial.rt_ms, 50);
    }

    #[test]
    fn first_response_ends_the_window() {
        let mut ctx = context(&[(1300, Key::N), (1310, Key::V)], ExperimentConfig::default());
        let trial = run(&mut ctx, BlockRole::FaceIdentification).unwrap();
        assert_eq!(trial.answer, Answer::Sad);
        assert_eq!(ctx.scheduler.now(), ms(1300));
    }

    #[test]
    fn sad_on_v_mapping_is_honoured() {
        let mut ctx = context_with_keymap(&[(1500, Key::V)], ExperimentConfig::default(), KeyMap::SadOnV);
        let trial = run(&mut ctx, BlockRole::WordIdentification).unwrap();
        assert_eq!(trial.answer, Answer::Sad);
        assert_eq!(trial.is_correct(), Some(true));
    }

    #[test]
    fn escape_aborts_mid_fixation() {
        let mut ctx = context(&[(400, Key::Escape)], ExperimentConfig::default());
        let err = run(&mut ctx, BlockRole::FaceIdentification).unwrap_err();
        assert!(err.is_abort());
        assert_eq!(ctx.triggers.codes(), vec![1]);
    }

    #[test]
    fn skip_key_only_works_in_debug() {
        let mut ctx = context(&[(100, Key::P)], ExperimentConfig::default());
        let stim = happy_face_sad_word();
        let mut seq = TrialSequencer::new(
            &stim,
            BlockRole::FaceIdentification,
            TrialSchedule::from(&ctx.config),
        );
        seq.step(&mut ctx).unwrap();
        assert_eq!(ctx.scheduler.now(), ms(1000));

        let debug = ExperimentConfig {
            debug: true,
            ..Default::default()
        };
        let mut ctx = context(&[(100, Key::P)], debug);
        let mut seq = TrialSequencer::new(
            &stim,
            BlockRole::FaceIdentification,
            TrialSchedule::from(&ctx.config),
        );
        seq.step(&mut ctx).unwrap();
        assert_eq!(ctx.scheduler.now(), ms(100));
        assert_eq!(seq.state(), TrialState::Exposure);
    }

    #[test]
    fn offset_fixation_trigger_fires_after_the_dwell() {
        let config = ExperimentConfig {
            fixation_trigger: FixationTrigger::Offset,
            ..Default::default()
        };
        let mut ctx = context(&[(300, Key::Escape)], config);
        let err = run(&mut ctx, BlockRole::FaceIdentification).unwrap_err();
        assert!(err.is_abort());
        assert!(ctx.triggers.codes().is_empty());

        let config = ExperimentConfig {
            fixation_trigger: FixationTrigger::Offset,
            ..Default::default()
        };
        let mut ctx = context(&[], config);
        run(&mut ctx, BlockRole::FaceIdentification).unwrap();
        assert_eq!(ctx.triggers.codes(), vec![1, 21, 250]);
    }

    #[test]
    fn undecodable_image_keeps_the_schedule() {
        let mut ctx = context(&[(1500, Key::V)], ExperimentConfig::default());
        ctx.screen.fail_prepare = true;
        let trial = run(&mut ctx, BlockRole::FaceIdentification).unwrap();
        assert_eq!(trial.rt_ms, 300);
        assert_eq!(
            ctx.screen.calls,
            vec![
                ScreenCall::Fixation,
                ScreenCall::Prepare("HF01".into()),
                ScreenCall::Stimulus("HF01".into()),
            ]
        );
    }

    #[test]
    fn phase_onsets_follow_the_schedule() {
        let mut ctx = context(&[], ExperimentConfig::default());
        let stim = happy_face_sad_word();
        let mut seq = TrialSequencer::new(
            &stim,
            BlockRole::FaceIdentification,
            TrialSchedule::from(&ctx.config),
        );
        while seq.state() != TrialState::Complete {
            seq.step(&mut ctx).unwrap();
        }
        let ts = seq.timestamps();
        assert_eq!(ts.fixation, Some(0));
        assert_eq!(ts.exposure, Some(ms(1000)));
        assert_eq!(ts.response_open, Some(ms(1200)));
        assert_eq!(ts.response, None);
    }
}
