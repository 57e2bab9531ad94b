//! Scene markers for remote viewers

use std::collections::HashMap;

use glam::Vec3;
use overlook_core::{CameraPose, UserId};
use overlook_net::AvatarScene;
use tracing::debug;

/// Marker drawn where a remote viewer's camera is
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Avatar {
    pub pose: CameraPose,
    /// Stable per-user tint
    pub color: [f32; 3],
}

impl Avatar {
    fn new(user_id: UserId, pose: CameraPose) -> Self {
        Self {
            pose,
            color: tint_for(user_id),
        }
    }

    /// Where the remote viewer is looking
    pub fn gaze(&self) -> Vec3 {
        self.pose.forward()
    }
}

/// Remote-viewer markers keyed by user
#[derive(Debug, Default)]
pub struct AvatarRoster {
    avatars: HashMap<UserId, Avatar>,
}

impl AvatarRoster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&UserId, &Avatar)> {
        self.avatars.iter()
    }

    pub fn len(&self) -> usize {
        self.avatars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.avatars.is_empty()
    }

    /// Window title with the number of remote viewers, if any
    pub fn window_title(&self, base: &str) -> String {
        if self.is_empty() {
            base.to_string()
        } else {
            format!("{} ({} watching)", base, self.len())
        }
    }
}

impl AvatarScene for AvatarRoster {
    fn spawn_avatar(&mut self, user_id: UserId, pose: &CameraPose) {
        debug!(%user_id, "Spawning avatar");
        self.avatars.insert(user_id, Avatar::new(user_id, *pose));
    }

    fn place_avatar(&mut self, user_id: UserId, pose: &CameraPose) {
        self.avatars
            .entry(user_id)
            .and_modify(|avatar| avatar.pose = *pose)
            .or_insert_with(|| Avatar::new(user_id, *pose));
    }

    fn despawn_avatar(&mut self, user_id: UserId) {
        if self.avatars.remove(&user_id).is_some() {
            debug!(%user_id, "Despawned avatar");
        }
    }
}

/// Bright color derived from the id bytes
fn tint_for(user_id: UserId) -> [f32; 3] {
    let bytes = user_id.0.as_bytes();
    let channel = |b: u8| 0.35 + 0.65 * (b as f32 / 255.0);
    [channel(bytes[0]), channel(bytes[1]), channel(bytes[2])]
}
