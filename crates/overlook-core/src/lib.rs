//! Overlook Core - Core types and utilities for the Overlook viewer
//!
//! This crate provides the foundational types shared by the navigation
//! controller, the relay and the viewer host:
//! - Mathematical primitives (re-exported from glam)
//! - Spherical coordinates, axis ranges and the camera pose
//! - Frame clock with delta-time clamping

pub mod time;
pub mod types;

pub use glam::{Quat, Vec2, Vec3};
pub use time::{Clock, FixedClock, FrameTime, TimeConfig};
pub use types::{AxisRange, CameraPose, Spherical, UserId};
