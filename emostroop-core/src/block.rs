use crate::stimulus::{Emotion, Stimulus};
use serde::{Deserialize, Serialize};

/// Which attribute of the stimulus the participant must report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockRole {
    /// Report the emotion of the face, ignore the word.
    FaceIdentification,
    /// Report the emotion named by the word, ignore the face.
    WordIdentification,
}

impl BlockRole {
    /// Parses the operator code: `C` (cara, face) or `P` (palabra, word).
    pub fn from_code(code: &str) -> Option<BlockRole> {
        match code {
            "C" => Some(BlockRole::FaceIdentification),
            "P" => Some(BlockRole::WordIdentification),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            BlockRole::FaceIdentification => "C",
            BlockRole::WordIdentification => "P",
        }
    }

    /// Label written to the log's response-type column.
    pub fn label(&self) -> &'static str {
        match self {
            BlockRole::FaceIdentification => "Cara",
            BlockRole::WordIdentification => "Palabra",
        }
    }

    pub fn complement(&self) -> BlockRole {
        match self {
            BlockRole::FaceIdentification => BlockRole::WordIdentification,
            BlockRole::WordIdentification => BlockRole::FaceIdentification,
        }
    }

    /// The correct answer for `stimulus` under this role.
    pub fn ground_truth(&self, stimulus: &Stimulus) -> Emotion {
        match self {
            BlockRole::FaceIdentification => stimulus.face(),
            BlockRole::WordIdentification => stimulus.word(),
        }
    }
}

/// An ordered, already-shuffled list of stimuli run under one response rule.
#[derive(Debug, Clone)]
pub struct Block {
    index: u8,
    role: BlockRole,
    stimuli: Vec<Stimulus>,
}

impl Block {
    pub fn new(index: u8, role: BlockRole, stimuli: Vec<Stimulus>) -> Self {
        Self {
            index,
            role,
            stimuli,
        }
    }

    /// 1 or 2, position in the session.
    pub fn index(&self) -> u8 {
        self.index
    }

    pub fn role(&self) -> BlockRole {
        self.role
    }

    pub fn stimuli(&self) -> &[Stimulus] {
        &self.stimuli
    }

    pub fn len(&self) -> usize {
        self.stimuli.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stimuli.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_selects_ground_truth() {
        let s = Stimulus::new("Happy/x.png", Emotion::Happy, Emotion::Sad);
        assert_eq!(BlockRole::FaceIdentification.ground_truth(&s), Emotion::Happy);
        assert_eq!(BlockRole::WordIdentification.ground_truth(&s), Emotion::Sad);
    }

    #[test]
    fn codes_parse_and_complement() {
        assert_eq!(BlockRole::from_code("C"), Some(BlockRole::FaceIdentification));
        assert_eq!(BlockRole::from_code("P"), Some(BlockRole::WordIdentification));
        assert_eq!(BlockRole::from_code("c"), None);
        assert_eq!(
            BlockRole::FaceIdentification.complement(),
            BlockRole::WordIdentification
        );
    }
}
