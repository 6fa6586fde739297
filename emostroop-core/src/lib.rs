pub mod block;
pub mod error;
pub mod input;
pub mod participant;
pub mod phase;
pub mod screen;
pub mod stimulus;
pub mod trial;
pub mod trigger;

pub use block::{Block, BlockRole};
pub use error::{AssetError, ParticipantIdError};
pub use input::{InputEvent, InputKind, Key};
pub use participant::{KeyMap, ParticipantId, ResponseKey};
pub use phase::SessionPhase;
pub use screen::{Screen, Slide};
pub use stimulus::{Emotion, Stimulus};
pub use trial::{Answer, Trial, TrialState};
pub use trigger::Trigger;
