//! Virtual-clock doubles for driving the presentation loop in tests.

use emostroop_core::{AssetError, InputEvent, Key, Screen, Slide, Stimulus, Trigger};
use emostroop_timing::{Scheduler, Wake};
use emostroop_trigger::{TriggerError, TriggerSink};
use std::collections::VecDeque;
use std::io;

pub fn ms(ms: u64) -> u64 {
    ms * 1_000_000
}

/// Scripted input on a virtual clock. Time only moves when a wait
/// consumes an event or reaches its deadline.
pub struct SimScheduler {
    now: u64,
    script: VecDeque<InputEvent>,
}

impl SimScheduler {
    /// Key-up events at absolute times in milliseconds.
    pub fn with_keys(keys: &[(u64, Key)]) -> Self {
        let mut events: Vec<InputEvent> = keys
            .iter()
            .map(|&(at, key)| InputEvent::key_up(key, ms(at)))
            .collect();
        events.sort_by_key(|e| e.timestamp_ns);
        Self {
            now: 0,
            script: events.into(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Scheduler for SimScheduler {
    type Event = InputEvent;

    fn now(&self) -> u64 {
        self.now
    }

    fn wait_until(&mut self, deadline: Option<u64>) -> Wake<InputEvent> {
        let due = match (self.script.front(), deadline) {
            (Some(event), Some(deadline)) => event.timestamp_ns <= deadline,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => panic!("simulation waited for input with an empty script"),
        };
        if due {
            if let Some(event) = self.script.pop_front() {
                self.now = self.now.max(event.timestamp_ns);
                return Wake::Input(event);
            }
        }
        if let Some(deadline) = deadline {
            self.now = self.now.max(deadline);
        }
        Wake::Timeout
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScreenCall {
    Blank,
    Fixation,
    Prepare(String),
    Stimulus(String),
    Slide(String),
}

#[derive(Debug, Default)]
pub struct RecordingScreen {
    pub calls: Vec<ScreenCall>,
    pub fail_prepare: bool,
    pub closed: bool,
}

impl Screen for RecordingScreen {
    fn blank(&mut self) {
        self.calls.push(ScreenCall::Blank);
    }

    fn fixation(&mut self) {
        self.calls.push(ScreenCall::Fixation);
    }

    fn prepare(&mut self, stimulus: &Stimulus) -> Result<(), AssetError> {
        self.calls.push(ScreenCall::Prepare(stimulus.image_id()));
        if self.fail_prepare {
            return Err(AssetError::Decode {
                path: stimulus.image().to_path_buf(),
                reason: "simulated".into(),
            });
        }
        Ok(())
    }

    fn stimulus(&mut self, stimulus: &Stimulus) {
        self.calls.push(ScreenCall::Stimulus(stimulus.image_id()));
    }

    fn slide(&mut self, slide: &Slide) {
        let first = slide.lines.first().cloned().unwrap_or_default();
        self.calls.push(ScreenCall::Slide(first));
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

/// A trigger port whose every write fails, as with an unplugged cable.
#[derive(Debug, Default)]
pub struct FailingSink {
    pub attempts: u64,
}

impl TriggerSink for FailingSink {
    fn send(&mut self, trigger: Trigger) -> Result<(), TriggerError> {
        self.attempts += 1;
        Err(TriggerError::Write {
            code: trigger.code(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "device unplugged"),
        })
    }

    fn describe(&self) -> String {
        "failing".to_string()
    }
}
