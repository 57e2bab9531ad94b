//! Camera navigation module
//!
//! Orbit around a movable pivot, pan the pivot in the view plane, zoom along
//! the orbit radius, with every parameter smoothed toward its target.

mod config;
mod controller;
mod state;

pub use config::NavigationConfig;
pub use controller::NavigationController;
pub use state::{clamp_and_smooth, NavigationState, PivotLimits, SphericalLimits};
