/// Keys the presentation loop reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    V,
    N,
    Space,
    Escape,
    /// Debug-only phase skip.
    P,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    KeyUp(Key),
    /// The window was closed; handled like an abort.
    Quit,
}

/// An operator/participant input stamped with the clock reading (ns) at which it was received.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub timestamp_ns: u64,
}

impl InputEvent {
    pub fn key_up(key: Key, timestamp_ns: u64) -> Self {
        Self {
            kind: InputKind::KeyUp(key),
            timestamp_ns,
        }
    }

    pub fn quit(timestamp_ns: u64) -> Self {
        Self {
            kind: InputKind::Quit,
            timestamp_ns,
        }
    }

    pub fn is_abort(&self) -> bool {
        matches!(self.kind, InputKind::Quit | InputKind::KeyUp(Key::Escape))
    }
}
