use crate::block::BlockRole;
use crate::error::ParticipantIdError;
use crate::stimulus::Emotion;
use std::fmt;
use std::str::FromStr;

/// The two physical response keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseKey {
    V,
    N,
}

impl ResponseKey {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseKey::V => "V",
            ResponseKey::N => "N",
        }
    }
}

/// Which response key means "Happy". Fixed for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMap {
    /// `F`: V is Happy (feliz), N is Sad.
    HappyOnV,
    /// `T`: V is Sad (triste), N is Happy.
    SadOnV,
}

impl KeyMap {
    pub fn from_code(code: &str) -> Option<KeyMap> {
        match code {
            "F" => Some(KeyMap::HappyOnV),
            "T" => Some(KeyMap::SadOnV),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            KeyMap::HappyOnV => "F",
            KeyMap::SadOnV => "T",
        }
    }

    pub fn emotion_for(&self, key: ResponseKey) -> Emotion {
        match (self, key) {
            (KeyMap::HappyOnV, ResponseKey::V) | (KeyMap::SadOnV, ResponseKey::N) => Emotion::Happy,
            (KeyMap::HappyOnV, ResponseKey::N) | (KeyMap::SadOnV, ResponseKey::V) => Emotion::Sad,
        }
    }

    pub fn key_for(&self, emotion: Emotion) -> ResponseKey {
        if self.emotion_for(ResponseKey::V) == emotion {
            ResponseKey::V
        } else {
            ResponseKey::N
        }
    }
}

/// Characters that cannot appear in the log file name on any platform.
const RESERVED_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Operator-entered participant identifier: `{code}_{F|T}_{C|P}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantId {
    raw: String,
    code: String,
    keymap: KeyMap,
    first_block: BlockRole,
}

impl ParticipantId {
    /// Free-text participant code (the first field).
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The full string as entered, used in the log file name.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn keymap(&self) -> KeyMap {
        self.keymap
    }

    pub fn first_block(&self) -> BlockRole {
        self.first_block
    }

    pub fn second_block(&self) -> BlockRole {
        self.first_block.complement()
    }
}

impl FromStr for ParticipantId {
    type Err = ParticipantIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(ParticipantIdError::Empty);
        }
        if let Some(c) = raw
            .chars()
            .find(|c| c.is_control() || RESERVED_CHARS.contains(c))
        {
            return Err(ParticipantIdError::InvalidCharacter(c));
        }

        let fields: Vec<&str> = raw.split('_').map(str::trim).collect();
        let [code, keymap, block] = fields.as_slice() else {
            return Err(ParticipantIdError::WrongShape(fields.len()));
        };

        if code.is_empty() {
            return Err(ParticipantIdError::EmptyCode);
        }
        let keymap =
            KeyMap::from_code(keymap).ok_or_else(|| ParticipantIdError::KeyMap(keymap.to_string()))?;
        let first_block = BlockRole::from_code(block)
            .ok_or_else(|| ParticipantIdError::FirstBlock(block.to_string()))?;

        Ok(Self {
            raw: raw.to_string(),
            code: code.to_string(),
            keymap,
            first_block,
        })
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
