//! Overlook Nav - Camera navigation for the Overlook viewer
//!
//! Turns pointer, touch and wheel input into a smoothed orbit/pan camera
//! trajectory around a movable pivot.

pub mod camera;
pub mod input;
pub mod listener;
pub mod winit_input;

pub use camera::{NavigationConfig, NavigationController, NavigationState, PivotLimits, SphericalLimits};
pub use input::{
    FrameInput, InputSampler, Modifiers, NavigationMode, PointerButton, PointerDown, WheelDelta,
};
pub use listener::{GestureListeners, ListenerHandle, ListenerKind, ListenerRegistry, ListenerTable};
pub use winit_input::WinitInput;
