//! Remote-user state fed by relay events

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use overlook_core::{CameraPose, UserId};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::protocol::{PoseUpdate, PoseUpdates, ServerEvent};

/// Scene-side representation of remote users
pub trait AvatarScene {
    /// First update for `user_id` arrived
    fn spawn_avatar(&mut self, user_id: UserId, pose: &CameraPose);
    /// Later update for a known user
    fn place_avatar(&mut self, user_id: UserId, pose: &CameraPose);
    fn despawn_avatar(&mut self, user_id: UserId);
}

/// Last known state of one remote user
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RemoteUserState {
    pub user_id: UserId,
    pub pose: CameraPose,
    /// Updates received since the user was first seen
    pub updates: u64,
}

/// Applies relay events to the remote-user table and its scene.
///
/// Runs on the render thread; every call is non-blocking.
pub struct SessionIngest<S: AvatarScene> {
    scene: S,
    users: HashMap<UserId, RemoteUserState>,
    local_id: Option<UserId>,
}

impl<S: AvatarScene> SessionIngest<S> {
    pub fn new(scene: S) -> Self {
        Self {
            scene,
            users: HashMap::new(),
            local_id: None,
        }
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn local_id(&self) -> Option<UserId> {
        self.local_id
    }

    /// Ignore updates about `id` from now on; drops any state already held for it
    pub fn set_local_id(&mut self, id: UserId) {
        self.local_id = Some(id);
        self.remove_user(id);
    }

    pub fn get(&self, user_id: UserId) -> Option<&RemoteUserState> {
        self.users.get(&user_id)
    }

    pub fn users(&self) -> impl Iterator<Item = &RemoteUserState> {
        self.users.values()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Upsert a remote user's pose. Unknown users join implicitly.
    pub fn apply_remote_update(&mut self, user_id: UserId, pose: CameraPose) {
        if self.local_id == Some(user_id) {
            return;
        }

        match self.users.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let state = entry.get_mut();
                state.pose = pose;
                state.updates += 1;
                self.scene.place_avatar(user_id, &pose);
            }
            Entry::Vacant(entry) => {
                entry.insert(RemoteUserState {
                    user_id,
                    pose,
                    updates: 1,
                });
                self.scene.spawn_avatar(user_id, &pose);
                info!(%user_id, "Remote user joined");
            }
        }
    }

    /// Forget a remote user. Returns whether it was known.
    pub fn remove_user(&mut self, user_id: UserId) -> bool {
        if self.users.remove(&user_id).is_none() {
            return false;
        }
        self.scene.despawn_avatar(user_id);
        info!(%user_id, "Remote user left");
        true
    }

    pub fn handle_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::SessionAssigned(payload) => self.set_local_id(payload.id),
            // Avatars appear with the first pose, not on connect
            ServerEvent::UserConnected(payload) => debug!(user_id = %payload.id, "Remote user connected"),
            ServerEvent::UserDisconnected(payload) => {
                self.remove_user(payload.id);
            }
            ServerEvent::PositionUpdated(payload) => match PoseUpdate::from_value(payload) {
                Ok(update) => self.apply_pose_update(&update),
                Err(e) => warn!(error = %e, "Dropping malformed positionUpdated"),
            },
            ServerEvent::UpdateState(payload) => self.apply_state(payload),
        }
    }

    pub fn handle_events(&mut self, events: impl IntoIterator<Item = ServerEvent>) {
        for event in events {
            self.handle_event(event);
        }
    }

    fn apply_pose_update(&mut self, update: &PoseUpdate) {
        self.apply_remote_update(update.id, update.pose());
    }

    fn apply_state(&mut self, payload: Value) {
        let updates = match serde_json::from_value::<PoseUpdates>(payload) {
            Ok(updates) => updates.into_vec(),
            Err(e) => {
                warn!(error = %e, "Dropping malformed updateState");
                return;
            }
        };
        for update in updates {
            if update.is_finite() {
                self.apply_pose_update(&update);
            } else {
                warn!(user_id = %update.id, "Dropping non-finite pose in updateState");
            }
        }
    }
}
