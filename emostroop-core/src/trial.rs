use crate::stimulus::{Emotion, Stimulus};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Trial state machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialState {
    Fixation,
    Exposure,
    ResponseWait,
    Complete,
}

impl TrialState {
    pub fn next(&self) -> TrialState {
        match self {
            TrialState::Fixation => TrialState::Exposure,
            TrialState::Exposure => TrialState::ResponseWait,
            TrialState::ResponseWait | TrialState::Complete => TrialState::Complete,
        }
    }
}

/// What the participant answered, if anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Happy,
    Sad,
    Missed,
}

impl Answer {
    pub fn emotion(&self) -> Option<Emotion> {
        match self {
            Answer::Happy => Some(Emotion::Happy),
            Answer::Sad => Some(Emotion::Sad),
            Answer::Missed => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Answer::Happy => "Happy",
            Answer::Sad => "Sad",
            Answer::Missed => "Missed",
        }
    }
}

impl From<Emotion> for Answer {
    fn from(e: Emotion) -> Self {
        match e {
            Emotion::Happy => Answer::Happy,
            Emotion::Sad => Answer::Sad,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A completed trial: the consumed stimulus and the response it received.
#[derive(Debug, Clone, PartialEq)]
pub struct Trial {
    pub stimulus: Stimulus,
    pub rt_ms: u64,
    pub answer: Answer,
    correct: Option<bool>,
}

impl Trial {
    /// Scores `answer` against `truth`. A missed answer has no correctness.
    pub fn scored(stimulus: Stimulus, rt_ms: u64, answer: Answer, truth: Emotion) -> Self {
        let correct = answer.emotion().map(|e| e == truth);
        Self {
            stimulus,
            rt_ms,
            answer,
            correct,
        }
    }

    pub fn is_correct(&self) -> Option<bool> {
        self.correct
    }

    pub fn is_missed(&self) -> bool {
        self.answer == Answer::Missed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stim() -> Stimulus {
        Stimulus::new("Happy/a.jpg", Emotion::Happy, Emotion::Sad)
    }

    #[test]
    fn missed_trials_carry_no_correctness() {
        let t = Trial::scored(stim(), 1000, Answer::Missed, Emotion::Happy);
        assert_eq!(t.is_correct(), None);
        assert!(t.is_missed());
    }

    #[test]
    fn answered_trials_are_scored_against_truth() {
        assert_eq!(
            Trial::scored(stim(), 420, Answer::Happy, Emotion::Happy).is_correct(),
            Some(true)
        );
        assert_eq!(
            Trial::scored(stim(), 420, Answer::Happy, Emotion::Sad).is_correct(),
            Some(false)
        );
    }

    #[test]
    fn states_advance_in_order() {
        let mut s = TrialState::Fixation;
        let mut seen = vec![s];
        while s != TrialState::Complete {
            s = s.next();
            seen.push(s);
        }
        assert_eq!(
            seen,
            [
                TrialState::Fixation,
                TrialState::Exposure,
                TrialState::ResponseWait,
                TrialState::Complete
            ]
        );
    }
}
