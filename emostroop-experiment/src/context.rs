use crate::config::ExperimentConfig;
use crate::error::{ExperimentError, Result};
use emostroop_core::{InputEvent, InputKind, Key, KeyMap, Screen, Trigger};
use emostroop_timing::{Scheduler, Wake};
use emostroop_trigger::{TriggerError, TriggerSink};
use rand::Rng;
use tracing::{debug, info, warn};

/// How a timed wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEnd {
    /// The deadline passed.
    Elapsed,
    /// The debug skip key ended the phase early.
    Skipped,
    /// An accepted key was released at `timestamp_ns`.
    Key { key: Key, timestamp_ns: u64 },
}

/// Everything the presentation loop touches, built once per session and
/// passed by reference to each component.
pub struct Context<S, D, T, R> {
    pub scheduler: S,
    pub screen: D,
    pub triggers: T,
    pub rng: R,
    pub config: ExperimentConfig,
    keymap: KeyMap,
    failed_triggers: u64,
}

impl<S, D, T, R> Context<S, D, T, R>
where
    S: Scheduler<Event = InputEvent>,
    D: Screen,
    T: TriggerSink,
    R: Rng,
{
    pub fn new(
        scheduler: S,
        screen: D,
        triggers: T,
        rng: R,
        config: ExperimentConfig,
        keymap: KeyMap,
    ) -> Self {
        Self {
            scheduler,
            screen,
            triggers,
            rng,
            config,
            keymap,
            failed_triggers: 0,
        }
    }

    /// Response key mapping, fixed for the session.
    pub fn keymap(&self) -> KeyMap {
        self.keymap
    }

    /// Triggers that could not be delivered so far.
    pub fn failed_triggers(&self) -> u64 {
        self.failed_triggers
    }

    /// Sends a trigger. Hardware failures are logged, never propagated.
    ///
    /// The first failure is a warning; later ones go to debug so a dead
    /// channel does not flood the log.
    pub fn emit(&mut self, trigger: Trigger) {
        let err = match self.triggers.send(trigger) {
            Ok(()) => {
                debug!("Trigger {} at {} ns", trigger, self.scheduler.now());
                return;
            }
            Err(e) => e,
        };
        self.failed_triggers += 1;
        match (&err, self.failed_triggers) {
            (TriggerError::Unavailable, 1) => {
                warn!("Trigger {} skipped, channel unavailable", trigger)
            }
            (_, 1) => warn!("Failed to send trigger {}: {}", trigger, err),
            _ => debug!("Failed to send trigger {}: {}", trigger, err),
        }
    }

    /// Waits until `deadline` or until a key accepted by `accept` is released.
    ///
    /// Abort input unwinds with [`ExperimentError::Aborted`]; the skip key
    /// ends the wait early when debug mode is on. Other keys are ignored.
    pub fn wait(
        &mut self,
        deadline: Option<u64>,
        mut accept: impl FnMut(Key) -> bool,
    ) -> Result<PhaseEnd> {
        loop {
            match self.scheduler.wait_until(deadline) {
                Wake::Timeout => return Ok(PhaseEnd::Elapsed),
                Wake::Input(event) if event.is_abort() => {
                    info!("Abort requested at {} ns", event.timestamp_ns);
                    return Err(ExperimentError::Aborted);
                }
                Wake::Input(InputEvent {
                    kind: InputKind::KeyUp(Key::P),
                    ..
                }) if self.config.debug => {
                    debug!("Phase skipped");
                    return Ok(PhaseEnd::Skipped);
                }
                Wake::Input(InputEvent {
                    kind: InputKind::KeyUp(key),
                    timestamp_ns,
                }) => {
                    if accept(key) {
                        return Ok(PhaseEnd::Key { key, timestamp_ns });
                    }
                }
                Wake::Input(_) => {}
            }
        }
    }

    /// Waits `ms` milliseconds, still honouring abort and skip.
    pub fn dwell(&mut self, ms: u64) -> Result<PhaseEnd> {
        let deadline = self.scheduler.deadline_in(ms);
        self.wait(Some(deadline), |_| false)
    }

    /// Waits without timeout for the Space key.
    pub fn wait_for_space(&mut self) -> Result<()> {
        self.wait(None, |k| k == Key::Space).map(|_| ())
    }

    /// Releases the display, then the trigger channel.
    pub fn release(&mut self) {
        self.screen.close();
        self.triggers.close();
        if self.failed_triggers > 0 {
            warn!("{} trigger(s) could not be sent", self.failed_triggers);
        }
        info!("Display and trigger channel released");
    }
}
