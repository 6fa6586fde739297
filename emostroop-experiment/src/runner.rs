use crate::context::Context;
use crate::error::Result;
use crate::log::{LogRecord, TrialLog};
use crate::state::TrialSequencer;
use crate::trial::TrialSchedule;
use emostroop_core::{Block, InputEvent, Screen, Trial, Trigger};
use emostroop_timing::Scheduler;
use emostroop_trigger::TriggerSink;
use rand::Rng;
use tracing::{debug, info, warn};

/// Runs every stimulus of a block in order and streams each completed
/// trial to the session log before the next one starts.
pub struct BlockRunner<'a, L: TrialLog> {
    participant: &'a str,
    log: &'a mut L,
    completed: Vec<Trial>,
}

impl<'a, L: TrialLog> BlockRunner<'a, L> {
    pub fn new(participant: &'a str, log: &'a mut L) -> Self {
        Self {
            participant,
            log,
            completed: Vec::new(),
        }
    }

    /// Trials finished so far, including those of an interrupted run.
    pub fn completed(&self) -> &[Trial] {
        &self.completed
    }

    pub fn into_completed(self) -> Vec<Trial> {
        self.completed
    }

    pub fn run<S, D, T, R>(&mut self, ctx: &mut Context<S, D, T, R>, block: &Block) -> Result<Vec<Trial>>
    where
        S: Scheduler<Event = InputEvent>,
        D: Screen,
        T: TriggerSink,
        R: Rng,
    {
        info!(
            "Starting block {} ({}, {} trials)",
            block.index(),
            block.role().label(),
            block.len()
        );
        match Trigger::block_start(block.index()) {
            Some(trigger) => ctx.emit(trigger),
            None => warn!("Block {} has no start trigger", block.index()),
        }
        ctx.screen.blank();
        let lead_in = ctx.config.block_lead_in_ms;
        ctx.dwell(lead_in)?;

        let schedule = TrialSchedule::from(&ctx.config);
        self.completed.clear();
        self.completed.reserve(block.len());
        for (i, stimulus) in block.stimuli().iter().enumerate() {
            debug!("Block {} trial {}/{}", block.index(), i + 1, block.len());
            let trial = TrialSequencer::new(stimulus, block.role(), schedule).run(ctx)?;
            self.log
                .append(&LogRecord::new(self.participant, block, &trial))?;
            self.completed.push(trial);

            ctx.screen.blank();
            if i + 1 < block.len() {
                let (lo, hi) = ctx.config.iti_range_ms;
                let iti = ctx.rng.random_range(lo..=hi);
                ctx.dwell(iti)?;
            }
        }

        info!("Block {} finished", block.index());
        Ok(std::mem::take(&mut self.completed))
    }
}
