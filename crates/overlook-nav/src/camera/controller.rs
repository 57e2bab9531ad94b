//! Orbit/pan navigation controller

use glam::{Vec2, Vec3};
use overlook_core::{CameraPose, Clock};
use tracing::debug;

use crate::input::{FrameInput, InputSampler};
use crate::listener::{ListenerRegistry, ListenerTable};

use super::{NavigationConfig, NavigationState};

/// Camera navigation controller.
///
/// Input events go into [`input_mut`](Self::input_mut) as they arrive;
/// [`update`](Self::update) runs once per rendered frame and writes the
/// resulting pose into the camera it is handed.
#[derive(Debug)]
pub struct NavigationController<R: ListenerRegistry = ListenerTable> {
    config: NavigationConfig,
    state: NavigationState,
    input: InputSampler<R>,
    /// Smallest viewport side in pixels; drag deltas are divided by it so a
    /// drag across the viewport feels the same at any resolution
    viewport_scale: f32,
}

impl NavigationController<ListenerTable> {
    /// Create a controller for a viewport of `width` x `height` pixels
    pub fn new(config: NavigationConfig, width: u32, height: u32) -> Self {
        Self::with_registry(config, width, height, ListenerTable::new())
    }
}

impl<R: ListenerRegistry> NavigationController<R> {
    /// Create a controller whose gestures register listeners on `registry`
    pub fn with_registry(config: NavigationConfig, width: u32, height: u32, registry: R) -> Self {
        let state = NavigationState::new(&config);
        let mut controller = Self {
            config,
            state,
            input: InputSampler::with_registry(registry),
            viewport_scale: 1.0,
        };
        controller.set_viewport(width, height);
        controller
    }

    pub fn config(&self) -> &NavigationConfig {
        &self.config
    }

    pub fn state(&self) -> &NavigationState {
        &self.state
    }

    pub fn input(&self) -> &InputSampler<R> {
        &self.input
    }

    /// Event sink for pointer, touch and wheel input
    pub fn input_mut(&mut self) -> &mut InputSampler<R> {
        &mut self.input
    }

    pub fn viewport_scale(&self) -> f32 {
        self.viewport_scale
    }

    /// Update the viewport size. Zero-sized viewports (minimized windows) are
    /// ignored.
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        let smallest = width.min(height);
        if smallest == 0 {
            return;
        }
        self.viewport_scale = smallest as f32;
        debug!(width, height, "navigation viewport resized");
    }

    /// Jump the smoothed pose onto the current target
    pub fn snap(&mut self) {
        self.state.snap();
    }

    /// Pose derived from the smoothed state
    pub fn pose(&self) -> CameraPose {
        CameraPose::looking_at(self.state.eye(), self.state.pivot_smoothed)
    }

    /// Advance one frame.
    ///
    /// Consumes the input accumulated since the previous call, applies it to
    /// the target orbit/pivot, smooths toward the target and writes the new
    /// pose into `camera`. Panning uses `camera`'s current orientation, so
    /// pass the same pose every frame.
    pub fn update(&mut self, clock: &impl Clock, camera: &mut CameraPose) {
        let dt = clock.delta_seconds();
        let dt = if dt.is_finite() {
            dt.clamp(0.0, self.config.max_delta_time)
        } else {
            0.0
        };

        let frame = self.input.take_frame();
        self.apply_input(&frame, camera);

        let limits = &self.config.orbit_limits;
        self.state.orbit_smoothed = limits.smooth(
            self.state.orbit_smoothed,
            self.state.orbit,
            self.config.orbit_smoothing * dt,
        );
        let limits = &self.config.pivot_limits;
        self.state.pivot_smoothed = limits.smooth(
            self.state.pivot_smoothed,
            self.state.pivot,
            self.config.pivot_smoothing * dt,
        );

        camera.position = self.state.eye();
        camera.look_at(self.state.pivot_smoothed);
    }

    /// Release any gesture listeners still registered
    pub fn dispose(&mut self) {
        self.input.dispose();
    }

    fn apply_input(&mut self, frame: &FrameInput, camera: &CameraPose) {
        let config = &self.config;
        let orbit = &mut self.state.orbit;

        orbit.radius = config
            .orbit_limits
            .radius
            .clamp(orbit.radius + frame.zoom * config.zoom_sensitivity);

        if frame.orbit_drag != Vec2::ZERO {
            let step = config.drag_sensitivity / self.viewport_scale;
            orbit.theta = config.orbit_limits.theta.clamp(orbit.theta - frame.orbit_drag.x * step);
            orbit.phi = config.orbit_limits.phi.clamp(orbit.phi - frame.orbit_drag.y * step);
        }

        if frame.pan_drag != Vec2::ZERO {
            // Grab-the-scene panning: dragging right moves the pivot left
            let up = camera.rotation * Vec3::Y;
            let left = camera.rotation * -Vec3::X;
            self.state.pivot += up * (frame.pan_drag.y * config.pan_sensitivity)
                + left * (frame.pan_drag.x * config.pan_sensitivity);
        }

        self.state.pivot = config.pivot_limits.clamp(self.state.pivot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{Modifiers, PointerButton, PointerDown, WheelDelta};
    use glam::Vec2;
    use overlook_core::{FixedClock, Spherical};
    use std::f32::consts::PI;

    const FRAME: FixedClock = FixedClock(1.0 / 60.0);

    fn controller() -> (NavigationController, CameraPose) {
        let mut controller = NavigationController::new(NavigationConfig::default(), 800, 600);
        let mut camera = CameraPose::default();
        controller.update(&FixedClock(0.0), &mut camera);
        (controller, camera)
    }

    fn drag(controller: &mut NavigationController, button: PointerButton, delta: Vec2) {
        let input = controller.input_mut();
        input.drag_start(PointerDown {
            position: Vec2::new(400.0, 300.0),
            button,
            modifiers: Modifiers::default(),
        });
        input.drag_move(Vec2::new(400.0, 300.0) + delta);
        input.drag_end();
    }

    #[test]
    fn test_controller_creation() {
        let (controller, camera) = controller();
        assert_eq!(controller.viewport_scale(), 600.0);
        assert_eq!(controller.state().orbit, Spherical::new(30.0, PI * 0.35, -PI * 0.25));
        assert_eq!(camera.target, Vec3::new(0.0, 2.0, 0.0));
        assert!((camera.position - controller.state().eye()).length() < 1e-5);
        assert!(((camera.position - camera.target).length() - 30.0).abs() < 1e-3);
    }

    #[test]
    fn test_zoom_scenario() {
        let (mut controller, mut camera) = controller();
        controller.input_mut().wheel(WheelDelta::Pixel(-500.0));
        controller.update(&FRAME, &mut camera);

        assert!((controller.state().orbit.radius - 25.0).abs() < 1e-5);
        assert_eq!(controller.input().pending().zoom, 0.0);
    }

    #[test]
    fn test_radius_stays_within_limits() {
        let (mut controller, mut camera) = controller();
        let limits = controller.config().orbit_limits;
        for step in [-5000.0, 120.0, 9000.0, -40.0, -100_000.0, 3.0] {
            controller.input_mut().wheel(WheelDelta::Pixel(step));
            controller.update(&FRAME, &mut camera);
            assert!(limits.radius.contains(controller.state().orbit.radius));
            assert!(limits.radius.contains(controller.state().orbit_smoothed.radius));
        }
    }

    #[test]
    fn test_orbit_angles_stay_within_limits() {
        let (mut controller, mut camera) = controller();
        let limits = controller.config().orbit_limits;
        let deltas = [
            Vec2::new(3000.0, -3000.0),
            Vec2::new(-10_000.0, 10_000.0),
            Vec2::new(25.0, 40.0),
            Vec2::new(-1.0, -700.0),
        ];
        for delta in deltas {
            drag(&mut controller, PointerButton::Primary, delta);
            controller.update(&FRAME, &mut camera);
            let orbit = controller.state().orbit;
            assert!(limits.phi.contains(orbit.phi), "phi {}", orbit.phi);
            assert!(limits.theta.contains(orbit.theta), "theta {}", orbit.theta);
            assert!(limits.contains(&controller.state().orbit_smoothed));
        }
    }

    #[test]
    fn test_orbit_drag_is_resolution_independent() {
        let (mut small, mut small_camera) = controller();
        let mut large = NavigationController::new(NavigationConfig::default(), 1600, 1200);
        let mut large_camera = CameraPose::default();

        drag(&mut small, PointerButton::Primary, Vec2::new(60.0, 0.0));
        drag(&mut large, PointerButton::Primary, Vec2::new(120.0, 0.0));
        small.update(&FRAME, &mut small_camera);
        large.update(&FRAME, &mut large_camera);

        let expected = -PI * 0.25 - 60.0 / 600.0;
        assert!((small.state().orbit.theta - expected).abs() < 1e-5);
        assert!((large.state().orbit.theta - expected).abs() < 1e-5);
    }

    #[test]
    fn test_pivot_stays_within_limits() {
        let (mut controller, mut camera) = controller();
        let limits = controller.config().pivot_limits;
        let deltas = [
            Vec2::new(5000.0, 0.0),
            Vec2::new(0.0, -5000.0),
            Vec2::new(-9000.0, 9000.0),
            Vec2::new(30.0, 30.0),
        ];
        for delta in deltas {
            drag(&mut controller, PointerButton::Secondary, delta);
            controller.update(&FRAME, &mut camera);
            assert!(limits.contains(controller.state().pivot));
            assert!(limits.contains(controller.state().pivot_smoothed));
        }
    }

    #[test]
    fn test_pan_moves_pivot_without_rotating() {
        let (mut controller, mut camera) = controller();
        let before = controller.state().orbit;
        drag(&mut controller, PointerButton::Secondary, Vec2::new(0.0, 100.0));
        controller.update(&FRAME, &mut camera);

        assert_eq!(controller.state().orbit, before);
        // Dragging down moves the pivot along the camera's up vector
        assert!(controller.state().pivot.y > 2.0);
    }

    #[test]
    fn test_pan_then_orbit_press_in_one_frame() {
        let (mut controller, mut camera) = controller();
        let before = *controller.state();

        drag(&mut controller, PointerButton::Secondary, Vec2::new(100.0, 0.0));
        // Orbit press lands before the frame that consumes the pan
        controller.input_mut().drag_start(PointerDown {
            position: Vec2::new(500.0, 300.0),
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        });
        controller.update(&FRAME, &mut camera);

        let after = controller.state();
        assert_eq!(after.orbit, before.orbit);
        assert!((after.pivot - before.pivot).length() > 0.5);

        // The orbit gesture still drives the orbit on the next frame
        controller.input_mut().drag_move(Vec2::new(560.0, 300.0));
        controller.update(&FRAME, &mut camera);
        let expected = before.orbit.theta - 60.0 / 600.0;
        assert!((controller.state().orbit.theta - expected).abs() < 1e-5);
    }

    #[test]
    fn test_pan_follows_camera_orientation() {
        let (mut controller, _) = controller();
        // Camera looking down -Z: its left is world -X
        let mut camera = CameraPose::looking_at(Vec3::new(0.0, 2.0, 30.0), Vec3::new(0.0, 2.0, 0.0));
        drag(&mut controller, PointerButton::Secondary, Vec2::new(100.0, 0.0));
        let frame = controller.input_mut().take_frame();
        controller.apply_input(&frame, &camera);
        assert!((controller.state().pivot - Vec3::new(-1.0, 2.0, 0.0)).length() < 1e-5);

        // Camera looking down +X: its left is world -Z
        camera = CameraPose::looking_at(Vec3::new(-30.0, 2.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        drag(&mut controller, PointerButton::Secondary, Vec2::new(100.0, 0.0));
        let frame = controller.input_mut().take_frame();
        controller.apply_input(&frame, &camera);
        assert!((controller.state().pivot - Vec3::new(-1.0, 2.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn test_zero_input_zero_dt_is_idempotent() {
        let (mut controller, mut camera) = controller();
        drag(&mut controller, PointerButton::Primary, Vec2::new(40.0, 20.0));
        controller.update(&FRAME, &mut camera);

        let before = *controller.state();
        for _ in 0..10 {
            controller.update(&FixedClock(0.0), &mut camera);
        }
        assert_eq!(*controller.state(), before);
    }

    #[test]
    fn test_smoothing_converges_monotonically() {
        let (mut controller, mut camera) = controller();
        controller.input_mut().wheel(WheelDelta::Pixel(1500.0));
        controller.update(&FRAME, &mut camera);

        let target = controller.state().orbit.radius;
        assert_eq!(target, 45.0);
        let mut distance = (target - controller.state().orbit_smoothed.radius).abs();
        assert!(distance > 0.0);
        for _ in 0..100 {
            controller.update(&FRAME, &mut camera);
            let next = (target - controller.state().orbit_smoothed.radius).abs();
            if distance > 0.0 {
                assert!(next < distance, "{next} !< {distance}");
            }
            distance = next;
        }
        assert!(distance < 1e-2);
    }

    #[test]
    fn test_large_delta_time_is_clamped() {
        let (mut controller, mut camera) = controller();
        controller.input_mut().wheel(WheelDelta::Pixel(1500.0));
        controller.update(&FixedClock(1000.0), &mut camera);

        let smoothed = controller.state().orbit_smoothed.radius;
        let expected = 30.0 + 15.0 * controller.config().orbit_smoothing * controller.config().max_delta_time;
        assert!((smoothed - expected).abs() < 1e-4);

        controller.update(&FixedClock(f32::NAN), &mut camera);
        assert_eq!(controller.state().orbit_smoothed.radius, smoothed);
    }

    #[test]
    fn test_viewport_ignores_zero_size() {
        let (mut controller, _) = controller();
        controller.set_viewport(0, 900);
        assert_eq!(controller.viewport_scale(), 600.0);
        controller.set_viewport(1920, 1080);
        assert_eq!(controller.viewport_scale(), 1080.0);
    }

    #[test]
    fn test_dispose_releases_listeners() {
        let (mut controller, _) = controller();
        controller.input_mut().drag_start(PointerDown {
            position: Vec2::ZERO,
            button: PointerButton::Primary,
            modifiers: Modifiers::default(),
        });
        assert_eq!(controller.input().registry().active_count(), 2);
        controller.dispose();
        assert_eq!(controller.input().registry().active_count(), 0);
    }
}
