// view.rs - Renderer that hands frames from the render loop to the egui thread

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use conway::{Renderer, WindowFrame};
use eframe::egui;

const MESSAGE_LIFETIME: Duration = Duration::from_secs(3);

/// Latest frame plus the transient status message. The orchestrator writes,
/// `ui.rs` reads once per repaint.
pub struct FrameView {
    ctx: egui::Context,
    dimensions: (usize, usize),
    frame: Mutex<Option<WindowFrame>>,
    message: Mutex<Option<(String, Instant)>>,
    controls: AtomicBool,
}

impl FrameView {
    pub fn new(ctx: egui::Context, dimensions: (usize, usize)) -> Self {
        Self {
            ctx,
            dimensions,
            frame: Mutex::new(None),
            message: Mutex::new(None),
            controls: AtomicBool::new(false),
        }
    }

    pub fn latest(&self) -> Option<WindowFrame> {
        self.frame.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The current message, or `None` once it has been up long enough.
    pub fn message(&self) -> Option<String> {
        let mut message = self.message.lock().unwrap_or_else(PoisonError::into_inner);
        if message.as_ref().is_some_and(|(_, shown)| shown.elapsed() > MESSAGE_LIFETIME) {
            *message = None;
        }
        message.as_ref().map(|(text, _)| text.clone())
    }

    pub fn show_controls(&self) -> bool {
        self.controls.load(Ordering::Relaxed)
    }
}

impl Renderer for FrameView {
    fn render_window(&self, frame: WindowFrame) {
        *self.frame.lock().unwrap_or_else(PoisonError::into_inner) = Some(frame);
        self.ctx.request_repaint();
    }

    fn grid_dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    fn display_controls(&self) {
        self.controls.store(true, Ordering::Relaxed);
        self.ctx.request_repaint();
    }

    fn display_message(&self, message: &str) {
        *self.message.lock().unwrap_or_else(PoisonError::into_inner) = Some((message.to_string(), Instant::now()));
        self.ctx.request_repaint_after(MESSAGE_LIFETIME);
    }
}
