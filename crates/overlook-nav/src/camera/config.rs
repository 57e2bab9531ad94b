//! Navigation configuration

use std::f32::consts::PI;

use glam::Vec3;
use overlook_core::{AxisRange, Spherical};
use serde::{Deserialize, Serialize};

use super::state::{PivotLimits, SphericalLimits};

/// Navigation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NavigationConfig {
    /// Starting orbit around the pivot
    pub initial_orbit: Spherical,
    /// Per-field limits for the orbit
    pub orbit_limits: SphericalLimits,
    /// Orbit smoothing rate (per second)
    pub orbit_smoothing: f32,
    /// Starting pivot
    pub initial_pivot: Vec3,
    /// Per-axis limits for the pivot
    pub pivot_limits: PivotLimits,
    /// Pivot smoothing rate (per second)
    pub pivot_smoothing: f32,
    /// Orbit drag sensitivity (radians per viewport side dragged)
    pub drag_sensitivity: f32,
    /// Pan sensitivity (world units per pixel)
    pub pan_sensitivity: f32,
    /// Zoom sensitivity (world units per wheel pixel)
    pub zoom_sensitivity: f32,
    /// Largest frame step fed into the smoothing filters (seconds)
    pub max_delta_time: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            initial_orbit: Spherical::new(30.0, PI * 0.35, -PI * 0.25),
            orbit_limits: SphericalLimits {
                radius: AxisRange::new(10.0, 50.0),
                phi: AxisRange::new(0.01, PI * 0.5),
                theta: AxisRange::new(-PI * 0.5, 0.0),
            },
            orbit_smoothing: 5.0,
            initial_pivot: Vec3::new(0.0, 2.0, 0.0),
            pivot_limits: PivotLimits {
                x: AxisRange::new(-4.0, 4.0),
                y: AxisRange::new(1.0, 6.0),
                z: AxisRange::new(-4.0, 4.0),
            },
            pivot_smoothing: 5.0,
            drag_sensitivity: 1.0,
            pan_sensitivity: 0.01,
            zoom_sensitivity: 0.01,
            max_delta_time: 0.1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_initial_values_within_limits() {
        let config = NavigationConfig::default();
        assert!(config.orbit_limits.contains(&config.initial_orbit));
        assert!(config.pivot_limits.contains(config.initial_pivot));
    }

    #[test]
    fn test_smoothing_stable_at_max_delta() {
        let config = NavigationConfig::default();
        assert!(config.orbit_smoothing * config.max_delta_time < 1.0);
        assert!(config.pivot_smoothing * config.max_delta_time < 1.0);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: NavigationConfig = toml::from_str("zoom_sensitivity = 0.02").unwrap();
        assert_eq!(config.zoom_sensitivity, 0.02);
        assert_eq!(config.drag_sensitivity, 1.0);
        assert_eq!(config.orbit_limits.radius, AxisRange::new(10.0, 50.0));
    }
}
