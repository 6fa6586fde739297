use crate::stimulus::Emotion;
use crate::trial::Answer;
use std::fmt;

/// Synchronisation markers sent to the recording hardware.
///
/// The numeric codes are a fixed contract with the acquisition setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    Fixation,
    HappyHappy,
    SadSad,
    HappySad,
    SadHappy,
    CorrectResponse,
    IncorrectResponse,
    NoResponse,
    BlockStart1,
    BlockStart2,
    NeutralStimulus,
    SessionStart,
    SessionStop,
}

impl Trigger {
    pub fn code(&self) -> u8 {
        match self {
            Trigger::Fixation => 1,
            Trigger::HappyHappy => 11,
            Trigger::SadSad => 12,
            Trigger::HappySad => 21,
            Trigger::SadHappy => 22,
            Trigger::CorrectResponse => 100,
            Trigger::IncorrectResponse => 200,
            Trigger::NoResponse => 250,
            Trigger::BlockStart1 => 51,
            Trigger::BlockStart2 => 52,
            Trigger::NeutralStimulus => 30,
            Trigger::SessionStart => 254,
            Trigger::SessionStop => 255,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Trigger::Fixation => "fixation",
            Trigger::HappyHappy => "happy_happy",
            Trigger::SadSad => "sad_sad",
            Trigger::HappySad => "happy_sad",
            Trigger::SadHappy => "sad_happy",
            Trigger::CorrectResponse => "correct_response",
            Trigger::IncorrectResponse => "incorrect_response",
            Trigger::NoResponse => "no_response",
            Trigger::BlockStart1 => "start_block_1",
            Trigger::BlockStart2 => "start_block_2",
            Trigger::NeutralStimulus => "neutral_stimulus",
            Trigger::SessionStart => "start_session",
            Trigger::SessionStop => "stop_session",
        }
    }

    /// Start marker for block `index`. Only blocks 1 and 2 have one.
    pub fn block_start(index: u8) -> Option<Trigger> {
        match index {
            1 => Some(Trigger::BlockStart1),
            2 => Some(Trigger::BlockStart2),
            _ => None,
        }
    }

    /// Condition marker keyed on (face emotion, word emotion).
    pub fn condition(face: Emotion, word: Emotion) -> Trigger {
        match (face, word) {
            (Emotion::Happy, Emotion::Happy) => Trigger::HappyHappy,
            (Emotion::Sad, Emotion::Sad) => Trigger::SadSad,
            (Emotion::Happy, Emotion::Sad) => Trigger::HappySad,
            (Emotion::Sad, Emotion::Happy) => Trigger::SadHappy,
        }
    }

    pub fn outcome(answer: Answer, correct: Option<bool>) -> Trigger {
        match (answer, correct) {
            (Answer::Missed, _) => Trigger::NoResponse,
            (_, Some(true)) => Trigger::CorrectResponse,
            _ => Trigger::IncorrectResponse,
        }
    }

    pub fn is_outcome(&self) -> bool {
        matches!(
            self,
            Trigger::CorrectResponse | Trigger::IncorrectResponse | Trigger::NoResponse
        )
    }

    pub fn is_condition(&self) -> bool {
        matches!(
            self,
            Trigger::HappyHappy | Trigger::SadSad | Trigger::HappySad | Trigger::SadHappy
        )
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}
