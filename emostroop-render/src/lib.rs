pub mod render;

pub use ab_glyph::FontVec;
pub use render::{STIMULUS_WIDTH, Scene, SkiaRenderer, load_font, load_stimulus};
