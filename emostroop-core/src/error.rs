use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParticipantIdError {
    #[error("participant ID is empty")]
    Empty,

    #[error("expected `id_keymap_block`, found {0} field(s)")]
    WrongShape(usize),

    #[error("participant code before the first '_' is empty")]
    EmptyCode,

    #[error("character {0:?} cannot be used in a file name")]
    InvalidCharacter(char),

    #[error("keyboard mapping must be F or T, found `{0}`")]
    KeyMap(String),

    #[error("first block must be C or P, found `{0}`")]
    FirstBlock(String),
}

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("asset directory not found: {0}")]
    MissingDirectory(PathBuf),

    #[error("no images found in {0}")]
    EmptyPool(PathBuf),

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
