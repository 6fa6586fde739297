use crate::error::TriggerError;
use emostroop_core::Trigger;

/// Synchronisation channel to the recording hardware.
///
/// `send` writes the code, holds it for the configured latency and
/// resets the line to 0. Failures are reported to the caller, which
/// logs them and carries on.
pub trait TriggerSink {
    fn send(&mut self, trigger: Trigger) -> Result<(), TriggerError>;

    /// Releases the channel. Sends after closing return `Unavailable`.
    fn close(&mut self) {}

    fn describe(&self) -> String;
}

impl<T: TriggerSink + ?Sized> TriggerSink for Box<T> {
    fn send(&mut self, trigger: Trigger) -> Result<(), TriggerError> {
        (**self).send(trigger)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Used when no hardware is attached.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TriggerSink for NullSink {
    fn send(&mut self, _trigger: Trigger) -> Result<(), TriggerError> {
        Ok(())
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}

/// Keeps every trigger in memory, in emission order.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    sent: Vec<Trigger>,
    closed: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[Trigger] {
        &self.sent
    }

    pub fn codes(&self) -> Vec<u8> {
        self.sent.iter().map(Trigger::code).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl TriggerSink for RecordingSink {
    fn send(&mut self, trigger: Trigger) -> Result<(), TriggerError> {
        if self.closed {
            return Err(TriggerError::Unavailable);
        }
        self.sent.push(trigger);
        Ok(())
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn describe(&self) -> String {
        format!("recording ({} sent)", self.sent.len())
    }
}
