//! Frame time for the Overlook viewer
//!
//! Tracks per-frame delta time and clamps it so that a stalled frame (a
//! minimized window, a debugger break) cannot feed a huge step into the
//! smoothing filters.

use serde::{Deserialize, Serialize};

/// Source of the elapsed time for the current frame, in seconds
pub trait Clock {
    fn delta_seconds(&self) -> f32;
}

/// Configuration for frame time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeConfig {
    /// How many seconds of navigation time pass per real second
    pub time_scale: f32,
    /// Whether to freeze time when the window loses focus
    pub pause_on_unfocus: bool,
    /// Maximum delta time accepted for a single frame
    pub max_delta_time: f32,
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            pause_on_unfocus: false,
            max_delta_time: 0.1,
        }
    }
}

/// Frame time tracking
#[derive(Debug, Clone, Default)]
pub struct FrameTime {
    /// Configuration
    pub config: TimeConfig,
    /// Time since start in seconds
    pub total_time: f64,
    /// Delta time for this frame (clamped and scaled)
    pub delta_time: f32,
    /// Delta time for this frame before scaling
    pub unscaled_delta_time: f32,
    /// Frame counter
    pub frame_count: u64,
    /// Whether time is frozen
    pub paused: bool,
}

impl FrameTime {
    /// Create a new frame time with custom config
    pub fn new(config: TimeConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Update with the raw delta from the previous frame
    pub fn update(&mut self, raw_delta: f32) {
        let raw_delta = if raw_delta.is_finite() { raw_delta } else { 0.0 };
        self.unscaled_delta_time = raw_delta.clamp(0.0, self.config.max_delta_time);
        self.frame_count += 1;

        if self.paused {
            self.delta_time = 0.0;
            return;
        }

        self.delta_time = self.unscaled_delta_time * self.config.time_scale;
        self.total_time += self.delta_time as f64;
    }

    /// Freeze time
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Unfreeze time
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Set the time scale (0.0 = frozen, 1.0 = normal)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.config.time_scale = scale.max(0.0);
    }
}

impl Clock for FrameTime {
    fn delta_seconds(&self) -> f32 {
        self.delta_time
    }
}

/// Clock that always reports the same step. Useful for tests and replays.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedClock(pub f32);

impl Clock for FixedClock {
    fn delta_seconds(&self) -> f32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_time() {
        let mut time = FrameTime::default();
        time.update(0.016);

        assert!(time.delta_time > 0.0);
        assert_eq!(time.frame_count, 1);

        time.pause();
        time.update(0.016);
        assert_eq!(time.delta_time, 0.0);
        assert_eq!(time.delta_seconds(), 0.0);
    }

    #[test]
    fn test_frame_time_clamps_large_delta() {
        let mut time = FrameTime::default();
        time.update(30.0);
        assert_eq!(time.delta_time, time.config.max_delta_time);

        time.update(-1.0);
        assert_eq!(time.delta_time, 0.0);

        time.update(f32::NAN);
        assert_eq!(time.delta_time, 0.0);
    }

    #[test]
    fn test_time_scale() {
        let mut time = FrameTime::default();
        time.set_time_scale(0.5);
        time.update(0.05);
        assert!((time.delta_time - 0.025).abs() < 1e-6);

        time.set_time_scale(-3.0);
        assert_eq!(time.config.time_scale, 0.0);
    }
}
