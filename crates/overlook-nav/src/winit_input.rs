//! Translation of winit window events into navigation input

use std::collections::BTreeMap;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, TouchPhase, WindowEvent};
use winit::keyboard::ModifiersState;

use crate::input::{InputSampler, Modifiers, PointerButton, PointerDown, WheelDelta};
use crate::listener::{ListenerKind, ListenerRegistry};

/// Tracks cursor, modifier and touch state between winit events and feeds
/// the resulting gestures into an [`InputSampler`].
#[derive(Debug, Default)]
pub struct WinitInput {
    cursor: Option<Vec2>,
    modifiers: Modifiers,
    /// Live touch points by winit touch id; the lowest id leads the gesture
    touches: BTreeMap<u64, Vec2>,
}

impl WinitInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one window event. Returns `true` if it was navigation input.
    pub fn handle_window_event<R: ListenerRegistry>(
        &mut self,
        sampler: &mut InputSampler<R>,
        event: &WindowEvent,
    ) -> bool {
        match event {
            WindowEvent::ModifiersChanged(modifiers) => {
                self.modifiers_changed(modifiers.state());
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_moved(sampler, Vec2::new(position.x as f32, position.y as f32));
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.cursor = None;
                false
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.mouse_button(sampler, *button, *state);
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.mouse_wheel(sampler, *delta);
                true
            }
            WindowEvent::Touch(touch) => {
                let location = Vec2::new(touch.location.x as f32, touch.location.y as f32);
                self.touch(sampler, touch.id, touch.phase, location);
                true
            }
            _ => false,
        }
    }

    /// Keyboard modifiers changed
    pub fn modifiers_changed(&mut self, state: ModifiersState) {
        self.modifiers = Modifiers {
            ctrl: state.control_key(),
            shift: state.shift_key(),
        };
    }

    /// Cursor moved to `position` (window pixels)
    pub fn cursor_moved<R: ListenerRegistry>(&mut self, sampler: &mut InputSampler<R>, position: Vec2) {
        self.cursor = Some(position);
        if sampler.registry().is_listening(ListenerKind::Move) {
            sampler.drag_move(position);
        }
    }

    /// Mouse button pressed or released
    pub fn mouse_button<R: ListenerRegistry>(
        &mut self,
        sampler: &mut InputSampler<R>,
        button: MouseButton,
        state: ElementState,
    ) {
        match state {
            ElementState::Pressed => {
                // Without a known cursor position there is nothing to drag from
                let Some(position) = self.cursor else {
                    return;
                };
                sampler.drag_start(PointerDown {
                    position,
                    button: pointer_button(button),
                    modifiers: self.modifiers,
                });
            }
            ElementState::Released => {
                if sampler.registry().is_listening(ListenerKind::End) {
                    sampler.drag_end();
                }
            }
        }
    }

    /// Wheel scrolled
    pub fn mouse_wheel<R: ListenerRegistry>(&mut self, sampler: &mut InputSampler<R>, delta: MouseScrollDelta) {
        // winit reports scrolling up as positive; the sampler expects scroll-down positive
        let delta = match delta {
            MouseScrollDelta::LineDelta(_, y) => WheelDelta::Line(-y),
            MouseScrollDelta::PixelDelta(position) => WheelDelta::Pixel(-(position.y as f32)),
        };
        sampler.wheel(delta);
    }

    /// Touch point changed
    pub fn touch<R: ListenerRegistry>(
        &mut self,
        sampler: &mut InputSampler<R>,
        id: u64,
        phase: TouchPhase,
        location: Vec2,
    ) {
        match phase {
            TouchPhase::Started => {
                self.touches.insert(id, location);
                sampler.touch_start(&self.points());
            }
            TouchPhase::Moved => {
                self.touches.insert(id, location);
                if sampler.registry().is_listening(ListenerKind::Move) {
                    sampler.touch_move(&self.points());
                }
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                // Any finger lifting ends the whole gesture. Fingers still down
                // are ignored until a new touch starts one again.
                self.touches.remove(&id);
                if sampler.registry().is_listening(ListenerKind::End) {
                    sampler.touch_end();
                }
            }
        }
    }

    fn points(&self) -> Vec<Vec2> {
        self.touches.values().copied().collect()
    }
}

fn pointer_button(button: MouseButton) -> PointerButton {
    match button {
        MouseButton::Left => PointerButton::Primary,
        MouseButton::Right => PointerButton::Secondary,
        MouseButton::Middle => PointerButton::Middle,
        MouseButton::Back => PointerButton::Other(3),
        MouseButton::Forward => PointerButton::Other(4),
        MouseButton::Other(id) => PointerButton::Other(id),
    }
}
