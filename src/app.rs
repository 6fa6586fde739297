use crate::config::DisplayConfig;
use anyhow::{anyhow, Result};
use emostroop_core::{AssetError, InputEvent, Key, Screen, Slide, Stimulus};
use emostroop_render::{FontVec, Scene, SkiaRenderer};
use emostroop_timing::{HighPrecisionTimer, Scheduler, Timer, Wake};
use pixels::{Pixels, SurfaceTexture};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use winit::{
    application::ApplicationHandler,
    dpi::{PhysicalSize, Size},
    event::{ElementState, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    platform::pump_events::{EventLoopExtPumpEvents, PumpStatus},
    window::{Fullscreen, Window, WindowId},
};

/// Below this much time to a deadline the scheduler polls instead of
/// blocking in the OS event wait.
const SPIN_THRESHOLD: Duration = Duration::from_millis(2);
/// Upper bound on a single blocking pump.
const MAX_PUMP: Duration = Duration::from_millis(16);
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Window, surface and renderer, driven by winit callbacks.
struct App {
    settings: DisplayConfig,
    font: Option<FontVec>,
    window: Option<Arc<Window>>,
    pixels: Option<Pixels<'static>>,
    renderer: Option<SkiaRenderer>,
    scene: Scene,
    queue: VecDeque<InputEvent>,
    clock: HighPrecisionTimer,
    present_timer: HighPrecisionTimer,
    refresh_rate: Option<f64>,
    failure: Option<anyhow::Error>,
}

impl App {
    fn new(settings: DisplayConfig, font: Option<FontVec>, clock: HighPrecisionTimer) -> Self {
        Self {
            settings,
            font,
            window: None,
            pixels: None,
            renderer: None,
            scene: Scene::Blank,
            queue: VecDeque::new(),
            clock,
            present_timer: HighPrecisionTimer::new(),
            refresh_rate: None,
            failure: None,
        }
    }

    fn create_window_and_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let monitor = event_loop
            .primary_monitor()
            .or_else(|| event_loop.available_monitors().next())
            .ok_or_else(|| anyhow!("No monitor available"))?;

        self.refresh_rate = monitor
            .refresh_rate_millihertz()
            .map(|rate| rate as f64 / 1000.0);

        let mut attributes = Window::default_attributes()
            .with_title("Emotional Stroop")
            .with_resizable(false);
        attributes = if self.settings.fullscreen {
            attributes.with_fullscreen(Some(Fullscreen::Borderless(Some(monitor))))
        } else {
            let (w, h) = self.settings.window_size;
            attributes.with_inner_size(Size::Physical(PhysicalSize::new(w, h)))
        };

        let window = Arc::new(event_loop.create_window(attributes)?);
        let size = window.inner_size();

        info!(
            "Display: {}x{} px, scale {:.2}, refresh {}",
            size.width,
            size.height,
            window.scale_factor(),
            self.refresh_rate
                .map_or_else(|| "unknown".to_string(), |hz| format!("{hz:.1} Hz"))
        );

        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        self.pixels = Some(Pixels::new(size.width, size.height, surface)?);
        self.renderer = Some(SkiaRenderer::new(
            size.width,
            size.height,
            self.font.take(),
        )?);

        window.set_cursor_visible(false);
        self.window = Some(window);
        self.present()
    }

    /// Draws the current scene and blocks until the surface accepted it.
    fn present(&mut self) -> Result<()> {
        let (Some(pixels), Some(renderer)) = (self.pixels.as_mut(), self.renderer.as_mut()) else {
            return Ok(());
        };
        let t = self.present_timer.now();
        renderer.draw(&self.scene);
        renderer.copy_to(pixels.frame_mut())?;
        pixels.render()?;
        let elapsed = self.present_timer.elapsed(t);
        self.present_timer.record_frame(elapsed);
        Ok(())
    }

    fn show(&mut self, scene: Scene) {
        self.scene = scene;
        if let Err(e) = self.present() {
            error!("Failed to present frame: {}", e);
        }
    }

    fn handle_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        if let Some(pixels) = &mut self.pixels {
            if let Err(e) = pixels.resize_surface(size.width, size.height) {
                warn!("Failed to resize surface: {}", e);
            }
            if let Err(e) = pixels.resize_buffer(size.width, size.height) {
                warn!("Failed to resize buffer: {}", e);
            }
        }
        if let Some(renderer) = &mut self.renderer {
            if let Err(e) = renderer.resize(size.width, size.height) {
                warn!("Failed to resize canvas: {}", e);
            }
        }
        debug!("Display resized to {}x{}", size.width, size.height);
        self.show(self.scene.clone());
    }

    fn push_key(&mut self, code: KeyCode) {
        let key = match code {
            KeyCode::KeyV => Key::V,
            KeyCode::KeyN => Key::N,
            KeyCode::Space => Key::Space,
            KeyCode::Escape => Key::Escape,
            KeyCode::KeyP => Key::P,
            _ => Key::Other,
        };
        self.queue
            .push_back(InputEvent::key_up(key, self.clock.now()));
    }

    fn release(&mut self) {
        if let Some(window) = &self.window {
            window.set_cursor_visible(true);
        }
        let present = self.present_timer.frame_stats();
        if present.samples > 0 {
            info!(
                "Frame present: {} frames, mean {:.3} ms, jitter {:.3} ms, max {:.3} ms",
                present.samples,
                present.average_frame_time_ns / 1e6,
                present.jitter_ns / 1e6,
                present.max_frame_time_ns / 1e6
            );
        }
        if let Some(renderer) = &self.renderer {
            let draw = renderer.draw_stats();
            debug!(
                "Frame composition: mean {:.3} ms, max {:.3} ms",
                draw.average_frame_time_ns / 1e6,
                draw.max_frame_time_ns / 1e6
            );
        }
        self.renderer = None;
        self.pixels = None;
        self.window = None;
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() && self.failure.is_none() {
            if let Err(e) = self.create_window_and_surface(event_loop) {
                self.failure = Some(e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, _event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.queue.push_back(InputEvent::quit(self.clock.now()));
            }
            WindowEvent::KeyboardInput { event, .. }
                if event.state == ElementState::Released && !event.repeat =>
            {
                if let PhysicalKey::Code(code) = event.physical_key {
                    self.push_key(code);
                }
            }
            WindowEvent::Resized(size) => self.handle_resize(size),
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.present() {
                    error!("Failed to present frame: {}", e);
                }
            }
            _ => {}
        }
    }
}

/// The winit event loop, as the session's clock and input source.
pub struct Frontend {
    event_loop: EventLoop<()>,
    app: Rc<RefCell<App>>,
    clock: HighPrecisionTimer,
    exited: bool,
}

/// The session's display, sharing the window with [`Frontend`].
pub struct Display {
    app: Rc<RefCell<App>>,
}

impl Frontend {
    /// Creates the window and waits until its first frame is on screen.
    pub fn open(settings: DisplayConfig, font: Option<FontVec>) -> Result<(Self, Display)> {
        let event_loop = EventLoop::new()?;
        let clock = HighPrecisionTimer::new();
        let app = Rc::new(RefCell::new(App::new(settings, font, clock.clone())));
        let mut frontend = Self {
            event_loop,
            app: Rc::clone(&app),
            clock,
            exited: false,
        };

        let deadline = frontend.clock.now() + STARTUP_TIMEOUT.as_nanos() as u64;
        loop {
            frontend.pump(Duration::from_millis(1));
            let mut app = frontend.app.borrow_mut();
            if let Some(e) = app.failure.take() {
                return Err(e);
            }
            if app.window.is_some() {
                break;
            }
            if frontend.exited || frontend.clock.now() > deadline {
                return Err(anyhow!("window was not created"));
            }
        }
        info!("Platform: {} {}", std::env::consts::OS, std::env::consts::ARCH);

        Ok((frontend, Display { app }))
    }

    fn pump(&mut self, timeout: Duration) {
        if self.exited {
            return;
        }
        let mut app = self.app.borrow_mut();
        if let PumpStatus::Exit(code) = self.event_loop.pump_app_events(Some(timeout), &mut *app) {
            debug!("Event loop exited with {}", code);
            self.exited = true;
            let now = self.clock.now();
            app.queue.push_back(InputEvent::quit(now));
        }
    }
}

impl Scheduler for Frontend {
    type Event = InputEvent;

    fn now(&self) -> u64 {
        self.clock.now()
    }

    fn wait_until(&mut self, deadline: Option<u64>) -> Wake<InputEvent> {
        loop {
            {
                let mut app = self.app.borrow_mut();
                if let Some(event) = app.queue.pop_front() {
                    match deadline {
                        Some(d) if event.timestamp_ns > d => app.queue.push_front(event),
                        _ => return Wake::Input(event),
                    }
                }
            }

            let now = self.clock.now();
            let timeout = match deadline {
                Some(d) if now >= d => return Wake::Timeout,
                Some(d) => {
                    let remaining = Duration::from_nanos(d - now);
                    if remaining <= SPIN_THRESHOLD {
                        Duration::ZERO
                    } else {
                        (remaining - SPIN_THRESHOLD).min(MAX_PUMP)
                    }
                }
                None => MAX_PUMP,
            };

            if self.exited {
                // nothing left to pump
                if deadline.is_none() && self.app.borrow().queue.is_empty() {
                    return Wake::Input(InputEvent::quit(now));
                }
                self.clock.sleep(timeout);
            } else {
                self.pump(timeout);
            }
        }
    }
}

impl Screen for Display {
    fn blank(&mut self) {
        self.app.borrow_mut().show(Scene::Blank);
    }

    fn fixation(&mut self) {
        self.app.borrow_mut().show(Scene::Fixation);
    }

    fn prepare(&mut self, stimulus: &Stimulus) -> Result<(), AssetError> {
        match self.app.borrow_mut().renderer.as_mut() {
            Some(renderer) => renderer.prepare(stimulus.image()),
            None => Ok(()),
        }
    }

    fn stimulus(&mut self, stimulus: &Stimulus) {
        self.app.borrow_mut().show(Scene::Stimulus {
            image: stimulus.image().to_path_buf(),
            word: stimulus.word(),
        });
    }

    fn slide(&mut self, slide: &Slide) {
        self.app.borrow_mut().show(Scene::Slide(slide.clone()));
    }

    fn close(&mut self) {
        self.app.borrow_mut().release();
        info!("Display closed");
    }
}
