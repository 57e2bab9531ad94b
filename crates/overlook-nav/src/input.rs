//! Input sampling for camera navigation
//!
//! Pointer, touch and wheel events arrive at any time between frames. The
//! sampler folds them into per-frame accumulators that the camera solver
//! consumes exactly once per tick.

use glam::Vec2;
use tracing::debug;

use crate::listener::{GestureListeners, ListenerRegistry, ListenerTable};

/// Pixels per wheel "line" (normalize-wheel convention)
pub const LINE_HEIGHT_PX: f32 = 40.0;
/// Pixels per wheel "page" (normalize-wheel convention)
pub const PAGE_HEIGHT_PX: f32 = 800.0;

/// Pointer button that started a drag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    /// Left mouse button / pen tip
    Primary,
    /// Right mouse button
    Secondary,
    /// Middle mouse button
    Middle,
    Other(u16),
}

/// Keyboard modifiers held when a gesture starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub shift: bool,
}

/// Pointer press that may start a drag
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDown {
    /// Position in window pixels
    pub position: Vec2,
    pub button: PointerButton,
    pub modifiers: Modifiers,
}

/// Raw vertical wheel delta in its platform unit.
///
/// Positive values scroll down (away from the content), which zooms out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WheelDelta {
    Pixel(f32),
    Line(f32),
    Page(f32),
}

impl WheelDelta {
    /// Vertical scroll amount in pixels
    pub fn normalized_pixels(self) -> f32 {
        match self {
            WheelDelta::Pixel(px) => px,
            WheelDelta::Line(lines) => lines * LINE_HEIGHT_PX,
            WheelDelta::Page(pages) => pages * PAGE_HEIGHT_PX,
        }
    }
}

/// How a drag gesture moves the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationMode {
    /// Rotate around the pivot
    #[default]
    Orbit,
    /// Translate the pivot in the view plane
    Pan,
}

impl NavigationMode {
    /// Classify a mouse drag from the button and modifiers held at its start
    pub fn for_pointer(button: PointerButton, modifiers: Modifiers) -> Self {
        if button == PointerButton::Secondary || modifiers.ctrl || modifiers.shift {
            NavigationMode::Pan
        } else {
            NavigationMode::Orbit
        }
    }

    /// Classify a touch gesture from the number of touch points at its start
    pub fn for_touches(count: usize) -> Self {
        if count > 1 {
            NavigationMode::Pan
        } else {
            NavigationMode::Orbit
        }
    }
}

/// Input accumulated over one frame.
///
/// Drag is split by the mode of the gesture that produced it, so a pan that
/// ends and an orbit that starts within one frame each keep their own mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    /// Pixel drag delta from orbit gestures
    pub orbit_drag: Vec2,
    /// Pixel drag delta from pan gestures
    pub pan_drag: Vec2,
    /// Normalized wheel delta in pixels
    pub zoom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureSource {
    Mouse,
    Touch,
}

#[derive(Debug)]
struct ActiveGesture {
    source: GestureSource,
    previous: Vec2,
    listeners: GestureListeners,
}

/// Accumulates drag and zoom input between frames
#[derive(Debug)]
pub struct InputSampler<R: ListenerRegistry = ListenerTable> {
    registry: R,
    gesture: Option<ActiveGesture>,
    mode: NavigationMode,
    orbit_accum: Vec2,
    pan_accum: Vec2,
    zoom_accum: f32,
}

impl Default for InputSampler<ListenerTable> {
    fn default() -> Self {
        Self::new()
    }
}

impl InputSampler<ListenerTable> {
    /// Create a sampler backed by an in-process listener table
    pub fn new() -> Self {
        Self::with_registry(ListenerTable::new())
    }
}

impl<R: ListenerRegistry> InputSampler<R> {
    /// Create a sampler that registers gesture listeners on `registry`
    pub fn with_registry(registry: R) -> Self {
        Self {
            registry,
            gesture: None,
            mode: NavigationMode::Orbit,
            orbit_accum: Vec2::ZERO,
            pan_accum: Vec2::ZERO,
            zoom_accum: 0.0,
        }
    }

    /// The listener registry gestures attach to
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Mode of the current (or most recent) gesture
    pub fn mode(&self) -> NavigationMode {
        self.mode
    }

    /// Whether a drag or touch gesture is in progress
    pub fn is_dragging(&self) -> bool {
        self.gesture.is_some()
    }

    /// Input accumulated since the last [`take_frame`](Self::take_frame)
    pub fn pending(&self) -> FrameInput {
        FrameInput {
            orbit_drag: self.orbit_accum,
            pan_drag: self.pan_accum,
            zoom: self.zoom_accum,
        }
    }

    /// Start a mouse drag. The mode is latched until the gesture ends.
    pub fn drag_start(&mut self, pointer: PointerDown) {
        if !pointer.position.is_finite() {
            return;
        }
        let mode = NavigationMode::for_pointer(pointer.button, pointer.modifiers);
        self.begin(GestureSource::Mouse, pointer.position, mode);
    }

    /// Pointer moved during a mouse drag
    pub fn drag_move(&mut self, position: Vec2) {
        self.advance(GestureSource::Mouse, position);
    }

    /// Mouse drag released
    pub fn drag_end(&mut self) {
        self.finish(GestureSource::Mouse);
    }

    /// Touch gesture started. More than one touch point pans.
    pub fn touch_start(&mut self, touches: &[Vec2]) {
        let Some(first) = touches.first().copied() else {
            return;
        };
        if !first.is_finite() {
            return;
        }
        self.begin(GestureSource::Touch, first, NavigationMode::for_touches(touches.len()));
    }

    /// Touch points moved; the first one drives the drag
    pub fn touch_move(&mut self, touches: &[Vec2]) {
        if let Some(first) = touches.first().copied() {
            self.advance(GestureSource::Touch, first);
        }
    }

    /// Touch gesture ended
    pub fn touch_end(&mut self) {
        self.finish(GestureSource::Touch);
    }

    /// Wheel scrolled
    pub fn wheel(&mut self, delta: WheelDelta) {
        let pixels = delta.normalized_pixels();
        if pixels.is_finite() {
            self.zoom_accum += pixels;
        }
    }

    /// Consume the accumulated input for this frame
    pub fn take_frame(&mut self) -> FrameInput {
        let frame = self.pending();
        self.orbit_accum = Vec2::ZERO;
        self.pan_accum = Vec2::ZERO;
        self.zoom_accum = 0.0;
        frame
    }

    /// Release any listeners held by an active gesture
    pub fn dispose(&mut self) {
        if let Some(gesture) = self.gesture.take() {
            gesture.listeners.release(&mut self.registry);
        }
    }

    fn begin(&mut self, source: GestureSource, position: Vec2, mode: NavigationMode) {
        // A gesture that never saw its end event must not keep its listeners
        self.dispose();

        let listeners = GestureListeners::acquire(&mut self.registry);
        self.mode = mode;
        self.gesture = Some(ActiveGesture {
            source,
            previous: position,
            listeners,
        });
        debug!(?source, ?mode, "gesture started");
    }

    fn advance(&mut self, source: GestureSource, position: Vec2) {
        if !position.is_finite() {
            return;
        }
        let Some(gesture) = self.gesture.as_mut().filter(|g| g.source == source) else {
            return;
        };
        let delta = position - gesture.previous;
        match self.mode {
            NavigationMode::Orbit => self.orbit_accum += delta,
            NavigationMode::Pan => self.pan_accum += delta,
        }
        gesture.previous = position;
    }

    fn finish(&mut self, source: GestureSource) {
        if self.gesture.as_ref().is_some_and(|g| g.source == source) {
            self.dispose();
            debug!(?source, "gesture ended");
        }
    }
}

impl<R: ListenerRegistry> Drop for InputSampler<R> {
    fn drop(&mut self) {
        self.dispose();
    }
}
