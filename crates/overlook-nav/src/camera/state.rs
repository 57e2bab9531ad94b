//! Navigation state: raw and smoothed orbit/pivot with their limits

use glam::Vec3;
use overlook_core::{AxisRange, Spherical};
use serde::{Deserialize, Serialize};

use super::NavigationConfig;

/// Closed intervals for each spherical field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphericalLimits {
    pub radius: AxisRange,
    pub phi: AxisRange,
    pub theta: AxisRange,
}

impl SphericalLimits {
    /// Clamp every field into its own interval
    pub fn clamp(&self, orbit: Spherical) -> Spherical {
        Spherical {
            radius: self.radius.clamp(orbit.radius),
            phi: self.phi.clamp(orbit.phi),
            theta: self.theta.clamp(orbit.theta),
        }
    }

    pub fn contains(&self, orbit: &Spherical) -> bool {
        self.radius.contains(orbit.radius)
            && self.phi.contains(orbit.phi)
            && self.theta.contains(orbit.theta)
    }

    /// Step each field of `smoothed` toward `raw`
    pub fn smooth(&self, smoothed: Spherical, raw: Spherical, factor: f32) -> Spherical {
        Spherical {
            radius: clamp_and_smooth(smoothed.radius, raw.radius, self.radius, factor),
            phi: clamp_and_smooth(smoothed.phi, raw.phi, self.phi, factor),
            theta: clamp_and_smooth(smoothed.theta, raw.theta, self.theta, factor),
        }
    }
}

/// Closed intervals for each pivot axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLimits {
    pub x: AxisRange,
    pub y: AxisRange,
    pub z: AxisRange,
}

impl PivotLimits {
    /// Clamp every axis into its own interval
    pub fn clamp(&self, pivot: Vec3) -> Vec3 {
        Vec3::new(
            self.x.clamp(pivot.x),
            self.y.clamp(pivot.y),
            self.z.clamp(pivot.z),
        )
    }

    pub fn contains(&self, pivot: Vec3) -> bool {
        self.x.contains(pivot.x) && self.y.contains(pivot.y) && self.z.contains(pivot.z)
    }

    /// Step each axis of `smoothed` toward `raw`
    pub fn smooth(&self, smoothed: Vec3, raw: Vec3, factor: f32) -> Vec3 {
        Vec3::new(
            clamp_and_smooth(smoothed.x, raw.x, self.x, factor),
            clamp_and_smooth(smoothed.y, raw.y, self.y, factor),
            clamp_and_smooth(smoothed.z, raw.z, self.z, factor),
        )
    }
}

/// One step of a single-pole low-pass filter, kept inside `range`.
///
/// `factor` is `rate * dt`, clamped to [0, 1] so a long frame lands on the
/// target instead of overshooting past it.
pub fn clamp_and_smooth(smoothed: f32, raw: f32, range: AxisRange, factor: f32) -> f32 {
    let factor = factor.clamp(0.0, 1.0);
    range.clamp(smoothed + (raw - smoothed) * factor)
}

/// Current and smoothed camera parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationState {
    /// Target orbit, updated directly by input
    pub orbit: Spherical,
    /// Orbit used for rendering, lags `orbit`
    pub orbit_smoothed: Spherical,
    /// Target pivot, updated directly by input
    pub pivot: Vec3,
    /// Pivot used for rendering, lags `pivot`
    pub pivot_smoothed: Vec3,
}

impl NavigationState {
    /// Build the initial state, clamped to the configured limits
    pub fn new(config: &NavigationConfig) -> Self {
        let orbit = config.orbit_limits.clamp(config.initial_orbit);
        let pivot = config.pivot_limits.clamp(config.initial_pivot);
        Self {
            orbit,
            orbit_smoothed: orbit,
            pivot,
            pivot_smoothed: pivot,
        }
    }

    /// Jump the smoothed values onto the raw values
    pub fn snap(&mut self) {
        self.orbit_smoothed = self.orbit;
        self.pivot_smoothed = self.pivot;
    }

    /// Eye position derived from the smoothed orbit and pivot
    pub fn eye(&self) -> Vec3 {
        self.orbit_smoothed.to_cartesian() + self.pivot_smoothed
    }
}
