use crate::error::AssetError;
use crate::stimulus::Stimulus;

/// A full-screen text page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slide {
    pub lines: Vec<String>,
    pub footer: Option<String>,
}

impl Slide {
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            footer: None,
        }
    }

    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

/// Display surface driven by the presentation loop.
///
/// Each call replaces the whole frame and returns once it is presented.
pub trait Screen {
    fn blank(&mut self);

    fn fixation(&mut self);

    /// Decodes the stimulus image ahead of its exposure.
    fn prepare(&mut self, stimulus: &Stimulus) -> Result<(), AssetError>;

    /// Shows the prepared face with its overlay word. If the image could not
    /// be prepared only the word is drawn.
    fn stimulus(&mut self, stimulus: &Stimulus);

    fn slide(&mut self, slide: &Slide);

    /// Releases the display at session end.
    fn close(&mut self) {}
}
