use ab_glyph::{Font, FontVec, Glyph, PxScale, ScaleFont, point};
use anyhow::{Context, Result, anyhow};
use bytemuck::cast_slice_mut;
use emostroop_cache::{FifoCache, intern_text};
use emostroop_core::{AssetError, Emotion, Slide};
use emostroop_timing::{FrameStats, HighPrecisionTimer, Timer};
use image::imageops::{self, FilterType};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tiny_skia::{Color, Paint, Pixmap, PixmapPaint, PremultipliedColorU8, Rect, Transform};
use tracing::{debug, warn};

/// Width every face is scaled to, in pixels.
pub const STIMULUS_WIDTH: u32 = 350;

const BACKGROUND: [u8; 4] = [255, 255, 255, 255];
const INK: [u8; 4] = [0, 0, 0, 255];
const WORD_COLOR: [u8; 4] = [0, 0, 255, 255];

const SLIDE_TEXT_PX: f32 = 32.0;
const FOOTER_TEXT_PX: f32 = 24.0;
const WORD_TEXT_PX: f32 = 32.0;
const LINE_STEP: f32 = 40.0;
const FOOTER_MARGIN: f32 = 15.0;

const FIXATION_SIZE: f32 = 40.0;
const FIXATION_THICKNESS: f32 = 4.0;

/// Decoded faces kept around; both blocks reuse the same images.
const IMAGE_CACHE_CAPACITY: usize = 256;

/// What the next frame shows.
#[derive(Debug, Clone, PartialEq)]
pub enum Scene {
    Blank,
    Fixation,
    Stimulus { image: PathBuf, word: Emotion },
    Slide(Slide),
}

pub fn load_font(path: &Path) -> Result<FontVec> {
    let bytes = std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))
}

/// Decodes a face image, scales it to [`STIMULUS_WIDTH`] keeping its aspect
/// ratio and converts it to BT.601 grayscale.
pub fn load_stimulus(path: &Path) -> std::result::Result<Pixmap, AssetError> {
    let decode_error = |reason: String| AssetError::Decode {
        path: path.to_path_buf(),
        reason,
    };

    let rgb = image::open(path)
        .map_err(|e| decode_error(e.to_string()))?
        .to_rgb8();
    let (w, h) = rgb.dimensions();
    if w == 0 || h == 0 {
        return Err(decode_error("image has no pixels".into()));
    }
    let height = ((h as f64 * STIMULUS_WIDTH as f64 / w as f64) as u32).max(1);
    let scaled = imageops::resize(&rgb, STIMULUS_WIDTH, height, FilterType::Triangle);

    let mut pm = Pixmap::new(STIMULUS_WIDTH, height)
        .ok_or_else(|| decode_error(format!("cannot allocate {STIMULUS_WIDTH}x{height}")))?;
    let pixels: &mut [[u8; 4]] = cast_slice_mut(pm.data_mut());
    for (dst, px) in pixels.iter_mut().zip(scaled.pixels()) {
        let [r, g, b] = px.0;
        let gray = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) as u8;
        *dst = [gray, gray, gray, 255];
    }
    Ok(pm)
}

fn color(c: [u8; 4]) -> Color {
    Color::from_rgba8(c[0], c[1], c[2], c[3])
}

fn layout(font: &FontVec, text: &str, scale: PxScale) -> (Vec<Glyph>, f32) {
    let sf = font.as_scaled(scale);
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::with_capacity(text.len());
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }
    (glyphs, pen_x)
}

/// Greedy word wrap to `max_width` pixels. Words wider than a line stay whole.
fn wrap(font: &FontVec, text: &str, size_px: f32, max_width: f32) -> Vec<String> {
    let scale = PxScale::from(size_px);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && layout(font, &candidate, scale).1 > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Rasterizes `text` into a tight transparent pixmap. `None` when nothing
/// in the string has an outline.
pub fn render_text_pixmap(text: &str, size_px: f32, font: &FontVec, rgba: [u8; 4]) -> Option<Pixmap> {
    let (glyphs, _) = layout(font, text, PxScale::from(size_px));

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    let outlines: Vec<_> = glyphs
        .iter()
        .filter_map(|g| font.outline_glyph(g.clone()))
        .collect();
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }
    if outlines.is_empty() {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // premultiplied source over what is already there
            let a = (cov * rgba[3] as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let inv = 1.0 - a;
            let bg = dst[i];
            let mix = |s: u8, d: u8| ((s as f32 * a) as u8).saturating_add((d as f32 * inv) as u8);
            let out_a = sa.saturating_add((bg.alpha() as f32 * inv) as u8);
            if let Some(px) = PremultipliedColorU8::from_rgba(
                mix(rgba[0], bg.red()).min(out_a),
                mix(rgba[1], bg.green()).min(out_a),
                mix(rgba[2], bg.blue()).min(out_a),
                out_a,
            ) {
                dst[i] = px;
            }
        });
    }
    Some(pm)
}

/// Rasterized strings keyed by interned text, size and color.
struct TextCache {
    font: Option<FontVec>,
    map: HashMap<(usize, u32, [u8; 4]), Arc<Pixmap>>,
}

impl TextCache {
    fn new(font: Option<FontVec>) -> Self {
        if font.is_none() {
            warn!("No font loaded, text will not be drawn");
        }
        Self {
            font,
            map: HashMap::new(),
        }
    }

    fn get_or_render(&mut self, text: &str, size_px: f32, rgba: [u8; 4]) -> Option<Arc<Pixmap>> {
        let font = self.font.as_ref()?;
        let key = (intern_text(text), size_px.to_bits(), rgba);
        if let Some(p) = self.map.get(&key) {
            return Some(Arc::clone(p));
        }
        let pm = Arc::new(render_text_pixmap(text, size_px, font, rgba)?);
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }

    fn wrap(&self, text: &str, size_px: f32, max_width: f32) -> Vec<String> {
        match &self.font {
            Some(font) => wrap(font, text, size_px, max_width),
            None => vec![text.to_string()],
        }
    }
}

/// Software compositor for every scene of the session.
///
/// Frames are built on an opaque premultiplied canvas, so its bytes can be
/// copied straight into an RGBA frame buffer.
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    text_cache: TextCache,
    images: FifoCache<PathBuf, Pixmap>,
    timer: HighPrecisionTimer,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: Option<FontVec>) -> Result<Self> {
        let mut canvas =
            Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        canvas.fill(color(BACKGROUND));
        Ok(Self {
            width,
            height,
            canvas,
            text_cache: TextCache::new(font),
            images: FifoCache::new(IMAGE_CACHE_CAPACITY),
            timer: HighPrecisionTimer::new(),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas =
            Pixmap::new(width, height).ok_or_else(|| anyhow!("invalid canvas size {width}x{height}"))?;
        self.canvas.fill(color(BACKGROUND));
        self.width = width;
        self.height = height;
        debug!("Canvas resized to {}x{}", width, height);
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Decodes `path` into the image cache if it is not there yet.
    pub fn prepare(&mut self, path: &Path) -> std::result::Result<(), AssetError> {
        self.images
            .get_or_try_insert_with(&path.to_path_buf(), || load_stimulus(path))
            .map(|_| ())
    }

    pub fn is_prepared(&self, path: &Path) -> bool {
        self.images.contains(&path.to_path_buf())
    }

    pub fn draw(&mut self, scene: &Scene) {
        let t = self.timer.now();
        self.canvas.fill(color(BACKGROUND));
        match scene {
            Scene::Blank => {}
            Scene::Fixation => self.draw_fixation(),
            Scene::Stimulus { image, word } => self.draw_stimulus(image, *word),
            Scene::Slide(slide) => self.draw_slide(slide),
        }
        let elapsed = self.timer.elapsed(t);
        self.timer.record_frame(elapsed);
    }

    /// RGBA bytes of the last drawn frame.
    pub fn frame(&self) -> &[u8] {
        self.canvas.data()
    }

    pub fn copy_to(&self, frame: &mut [u8]) -> Result<()> {
        let src = self.canvas.data();
        if frame.len() != src.len() {
            return Err(anyhow!(
                "frame buffer holds {} bytes, canvas {}",
                frame.len(),
                src.len()
            ));
        }
        frame.copy_from_slice(src);
        Ok(())
    }

    /// Composition time per drawn frame.
    pub fn draw_stats(&self) -> FrameStats {
        self.timer.frame_stats()
    }

    fn center(&self) -> (f32, f32) {
        (self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    fn draw_fixation(&mut self) {
        let (cx, cy) = self.center();
        let mut paint = Paint::default();
        paint.anti_alias = false;
        paint.set_color(color(INK));

        let bars = [
            Rect::from_xywh(
                cx - FIXATION_SIZE / 2.0,
                cy - FIXATION_THICKNESS / 2.0,
                FIXATION_SIZE,
                FIXATION_THICKNESS,
            ),
            Rect::from_xywh(
                cx - FIXATION_THICKNESS / 2.0,
                cy - FIXATION_SIZE / 2.0,
                FIXATION_THICKNESS,
                FIXATION_SIZE,
            ),
        ];
        for bar in bars.into_iter().flatten() {
            self.canvas.fill_rect(bar, &paint, Transform::identity(), None);
        }
    }

    fn draw_stimulus(&mut self, image: &Path, word: Emotion) {
        let center = self.center();
        match self.images.get(&image.to_path_buf()) {
            Some(face) => self.blit_centered(&face, center),
            None => debug!("{} not prepared, drawing the word only", image.display()),
        }
        if let Some(label) = self.text_cache.get_or_render(word.word(), WORD_TEXT_PX, WORD_COLOR) {
            self.blit_centered(&label, center);
        }
    }

    fn draw_slide(&mut self, slide: &Slide) {
        let max_width = self.width as f32 * 0.85;
        let lines: Vec<String> = slide
            .lines
            .iter()
            .flat_map(|line| {
                let wrapped = self.text_cache.wrap(line, SLIDE_TEXT_PX, max_width);
                if wrapped.is_empty() {
                    vec![String::new()]
                } else {
                    wrapped
                }
            })
            .collect();

        let (cx, cy) = self.center();
        let top = cy - LINE_STEP * lines.len() as f32 / 2.0 + LINE_STEP / 2.0;
        for (i, line) in lines.iter().enumerate() {
            if line.is_empty() {
                continue;
            }
            if let Some(pm) = self.text_cache.get_or_render(line, SLIDE_TEXT_PX, INK) {
                self.blit_centered(&pm, (cx, top + i as f32 * LINE_STEP));
            }
        }

        // bottom-left corner
        if let Some(footer) = &slide.footer {
            if let Some(pm) = self.text_cache.get_or_render(footer, FOOTER_TEXT_PX, INK) {
                let x = FOOTER_MARGIN as i32;
                let y = (self.height as f32 - FOOTER_MARGIN) as i32 - pm.height() as i32;
                self.blit_at(&pm, x, y);
            }
        }
    }

    fn blit_centered(&mut self, pm: &Pixmap, pos: (f32, f32)) {
        let x = (pos.0 - pm.width() as f32 * 0.5).floor() as i32;
        let y = (pos.1 - pm.height() as f32 * 0.5).floor() as i32;
        self.blit_at(pm, x, y);
    }

    fn blit_at(&mut self, pm: &Pixmap, x: i32, y: i32) {
        self.canvas.draw_pixmap(
            x,
            y,
            pm.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}
