use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The two emotion categories used both for faces and for overlay words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Happy,
    Sad,
}

impl Emotion {
    pub const ALL: [Emotion; 2] = [Emotion::Happy, Emotion::Sad];

    /// Canonical label, also the name of the asset directory holding this category.
    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Happy => "Happy",
            Emotion::Sad => "Sad",
        }
    }

    /// Word shown to the participant over the face.
    pub fn word(&self) -> &'static str {
        match self {
            Emotion::Happy => "Feliz",
            Emotion::Sad => "Triste",
        }
    }

    pub fn opposite(&self) -> Emotion {
        match self {
            Emotion::Happy => Emotion::Sad,
            Emotion::Sad => Emotion::Happy,
        }
    }

    pub fn from_label(label: &str) -> Option<Emotion> {
        match label {
            "Happy" => Some(Emotion::Happy),
            "Sad" => Some(Emotion::Sad),
            _ => None,
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A face image paired with an overlay word.
///
/// `face` is the ground-truth category of the image, resolved when the
/// asset pools are listed; nothing downstream looks at the path layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stimulus {
    image: PathBuf,
    face: Emotion,
    word: Emotion,
}

impl Stimulus {
    pub fn new(image: impl Into<PathBuf>, face: Emotion, word: Emotion) -> Self {
        Self {
            image: image.into(),
            face,
            word,
        }
    }

    pub fn image(&self) -> &Path {
        &self.image
    }

    pub fn face(&self) -> Emotion {
        self.face
    }

    pub fn word(&self) -> Emotion {
        self.word
    }

    pub fn is_congruent(&self) -> bool {
        self.face == self.word
    }

    /// Identifier written to the log: file name up to its first '.'.
    pub fn image_id(&self) -> String {
        self.image
            .file_name()
            .map(|n| n.to_string_lossy())
            .and_then(|n| n.split('.').next().map(str::to_owned))
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_id_stops_at_first_dot() {
        let s = Stimulus::new("media/images/Happy/AF01HAS.v2.jpg", Emotion::Happy, Emotion::Sad);
        assert_eq!(s.image_id(), "AF01HAS");
        assert!(!s.is_congruent());
    }

    #[test]
    fn labels_round_trip_and_words() {
        for e in Emotion::ALL {
            assert_eq!(Emotion::from_label(e.label()), Some(e));
        }
        assert_eq!(Emotion::Happy.word(), "Feliz");
        assert_eq!(Emotion::Sad.word(), "Triste");
        assert_eq!(Emotion::from_label("happy"), None);
    }
}
