//! Overlook - orbit/pan scene viewer with shared camera presence
//!
//! This is the main entry point for the viewer window.

mod avatars;
mod settings;

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use winit::{
    application::ApplicationHandler,
    dpi::PhysicalSize,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use overlook_core::{CameraPose, FrameTime};
use overlook_nav::{NavigationController, WinitInput};
use overlook_net::{PoseUpdate, RelayClient, SessionIngest};

use crate::avatars::AvatarRoster;
use crate::settings::ViewerSettings;

/// Throttles pose updates to the relay
struct SyncTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl SyncTimer {
    fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    /// True at most once per interval
    fn due(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}

/// Application state
struct OverlookApp {
    settings: ViewerSettings,
    window: Option<Window>,
    controller: NavigationController,
    winit_input: WinitInput,
    camera: CameraPose,
    frame_time: FrameTime,
    last_frame: Option<Instant>,
    relay: Option<RelayClient>,
    ingest: SessionIngest<AvatarRoster>,
    sync: SyncTimer,
    remote_count: usize,
}

impl OverlookApp {
    fn new(settings: ViewerSettings, relay: Option<RelayClient>) -> Self {
        let controller = NavigationController::new(
            settings.navigation.clone(),
            settings.window.width,
            settings.window.height,
        );
        let camera = controller.pose();
        Self {
            window: None,
            winit_input: WinitInput::new(),
            camera,
            frame_time: FrameTime::new(settings.frame.clone()),
            last_frame: None,
            relay,
            ingest: SessionIngest::new(AvatarRoster::new()),
            sync: SyncTimer::new(settings.network.sync_interval()),
            remote_count: 0,
            controller,
            settings,
        }
    }

    fn tick(&mut self) {
        let now = Instant::now();
        let raw_delta = self
            .last_frame
            .map(|last| now.duration_since(last).as_secs_f32())
            .unwrap_or(0.0);
        self.last_frame = Some(now);

        self.frame_time.update(raw_delta);
        self.controller.update(&self.frame_time, &mut self.camera);

        if let Some(relay) = &self.relay {
            self.ingest.handle_events(relay.drain());

            if let Some(local_id) = relay.local_id() {
                if self.sync.due(now) {
                    let orbit = self.controller.state().orbit_smoothed;
                    relay.send_pose(&PoseUpdate::new(local_id, &self.camera, orbit));
                }
            }
        }

        let roster = self.ingest.scene();
        if roster.len() != self.remote_count {
            self.remote_count = roster.len();
            if let Some(window) = &self.window {
                window.set_title(&roster.window_title(&self.settings.window.title));
            }
            for (user_id, avatar) in roster.iter() {
                debug!(
                    %user_id,
                    position = ?avatar.pose.position,
                    gaze = ?avatar.gaze(),
                    color = ?avatar.color,
                    "Remote viewer"
                );
            }
        }
    }
}

impl ApplicationHandler for OverlookApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let attributes = Window::default_attributes()
            .with_title(self.settings.window.title.clone())
            .with_inner_size(PhysicalSize::new(self.settings.window.width, self.settings.window.height));

        match event_loop.create_window(attributes) {
            Ok(window) => {
                let size = window.inner_size();
                info!("Window created: {}x{}", size.width, size.height);
                self.controller.set_viewport(size.width, size.height);
                self.controller.snap();
                self.camera = self.controller.pose();
                self.window = Some(window);
            }
            Err(e) => {
                warn!("Failed to create window: {}", e);
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Shutting down...");
                self.controller.dispose();
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                self.controller.set_viewport(size.width, size.height);
            }
            WindowEvent::Focused(focused) if self.settings.frame.pause_on_unfocus => {
                if focused {
                    self.frame_time.resume();
                } else {
                    self.frame_time.pause();
                }
            }
            WindowEvent::RedrawRequested => self.tick(),
            other => {
                if self.winit_input.handle_window_event(self.controller.input_mut(), &other) {
                    debug!(?other, "navigation input");
                }
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn connect_relay(settings: &ViewerSettings) -> Option<RelayClient> {
    let url = settings.network.relay_url.as_deref()?;
    match RelayClient::connect(url) {
        Ok(client) => {
            info!("Connecting to relay at {}", url);
            Some(client)
        }
        Err(e) => {
            warn!("Relay disabled: {}", e);
            None
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Starting Overlook viewer...");

    let settings = ViewerSettings::load();
    if ViewerSettings::settings_path().is_some_and(|path| !path.exists()) {
        if let Err(e) = settings.save() {
            warn!("Could not write default settings: {}", e);
        }
    }
    let settings = settings.with_env_overrides();
    let relay = connect_relay(&settings);

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = OverlookApp::new(settings, relay);
    event_loop.run_app(&mut app).context("Event loop failed")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sync_timer_throttles() {
        let mut timer = SyncTimer::new(Duration::from_millis(100));
        let start = Instant::now();
        assert!(timer.due(start));
        assert!(!timer.due(start + Duration::from_millis(50)));
        assert!(timer.due(start + Duration::from_millis(100)));
        assert!(!timer.due(start + Duration::from_millis(150)));
    }

    #[test]
    fn test_offline_settings_skip_relay() {
        let mut settings = ViewerSettings::default();
        settings.network.relay_url = None;
        assert!(connect_relay(&settings).is_none());
    }
}
