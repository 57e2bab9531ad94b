//! Relay wire contract
//!
//! Every frame is a JSON text message `{"event": <name>, "payload": <value>}`.

use glam::Vec3;
use overlook_core::{CameraPose, Spherical, UserId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RelayError;

/// `{id}` payload used by the presence events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: UserId,
}

/// Events a viewer sends to the relay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Announce the local user after connecting
    NewUser(UserPayload),
    /// Camera state; forwarded to other viewers without inspection.
    ///
    /// The payload is held as a parsed JSON value, so forwarding preserves
    /// its meaning but not its bytes: object keys may come out reordered and
    /// integers beyond 64 bits are re-emitted as floats.
    UpdatePosition(Value),
}

/// Events the relay sends to a viewer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Id the relay assigned to this connection
    SessionAssigned(UserPayload),
    UserConnected(UserPayload),
    /// Another viewer's `updatePosition` payload, as an equal JSON value
    PositionUpdated(Value),
    UserDisconnected(UserPayload),
    /// Aggregate state: one pose update or a list of them
    UpdateState(Value),
}

impl ClientEvent {
    pub fn to_text(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_text(text: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(text)?)
    }

    /// `updatePosition` carrying a pose update
    pub fn update_position(update: &PoseUpdate) -> Result<Self, RelayError> {
        Ok(ClientEvent::UpdatePosition(serde_json::to_value(update)?))
    }
}

impl ServerEvent {
    pub fn to_text(&self) -> Result<String, RelayError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_text(text: &str) -> Result<Self, RelayError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Camera state one viewer publishes about itself
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoseUpdate {
    pub id: UserId,
    /// Eye position
    pub position: Vec3,
    /// Look-at target (the pivot)
    pub target: Vec3,
    /// Orbit around the target that produced `position`
    pub orbit: Spherical,
}

impl PoseUpdate {
    pub fn new(id: UserId, pose: &CameraPose, orbit: Spherical) -> Self {
        Self {
            id,
            position: pose.position,
            target: pose.target,
            orbit,
        }
    }

    /// Camera pose reconstructed from position and target
    pub fn pose(&self) -> CameraPose {
        CameraPose::looking_at(self.position, self.target)
    }

    /// Decode a payload, rejecting non-finite vectors
    pub fn from_value(value: Value) -> Result<Self, RelayError> {
        let update: PoseUpdate = serde_json::from_value(value)?;
        if !update.is_finite() {
            return Err(RelayError::InvalidPayload("non-finite pose".into()));
        }
        Ok(update)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.target.is_finite()
            && self.orbit.radius.is_finite()
            && self.orbit.phi.is_finite()
            && self.orbit.theta.is_finite()
    }
}

/// `updateState` payload shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoseUpdates {
    One(PoseUpdate),
    Many(Vec<PoseUpdate>),
}

impl PoseUpdates {
    pub fn into_vec(self) -> Vec<PoseUpdate> {
        match self {
            PoseUpdates::One(update) => vec![update],
            PoseUpdates::Many(updates) => updates,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_client_event_wire_names() {
        let id = UserId::new();
        let text = ClientEvent::NewUser(UserPayload { id }).to_text().unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "newUser");
        assert_eq!(value["payload"]["id"], id.to_string());

        let parsed = ClientEvent::from_text(r#"{"event":"updatePosition","payload":{"x":1}}"#).unwrap();
        assert_eq!(parsed, ClientEvent::UpdatePosition(json!({"x": 1})));
    }

    #[test]
    fn test_server_event_wire_names() {
        let id = UserId::new();
        let cases = [
            (ServerEvent::SessionAssigned(UserPayload { id }), "sessionAssigned"),
            (ServerEvent::UserConnected(UserPayload { id }), "userConnected"),
            (ServerEvent::UserDisconnected(UserPayload { id }), "userDisconnected"),
            (ServerEvent::PositionUpdated(json!("anything")), "positionUpdated"),
            (ServerEvent::UpdateState(json!([])), "updateState"),
        ];
        for (event, name) in cases {
            let value: Value = serde_json::from_str(&event.to_text().unwrap()).unwrap();
            assert_eq!(value["event"], name);
            assert_eq!(ServerEvent::from_text(&event.to_text().unwrap()).unwrap(), event);
        }
    }

    #[test]
    fn test_forwarded_payload_is_equal_not_byte_identical() {
        let sent = r#"{"event":"updatePosition","payload":{"zeta":1,"alpha":{"b":2.5,"a":[true,null]}}}"#;
        let ClientEvent::UpdatePosition(payload) = ClientEvent::from_text(sent).unwrap() else {
            panic!("expected updatePosition");
        };

        let forwarded = ServerEvent::PositionUpdated(payload).to_text().unwrap();
        let forwarded: Value = serde_json::from_str(&forwarded).unwrap();
        assert_eq!(forwarded["event"], "positionUpdated");
        assert_eq!(forwarded["payload"], json!({"alpha": {"a": [true, null], "b": 2.5}, "zeta": 1}));
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(ServerEvent::from_text(r#"{"event":"teleport","payload":{}}"#).is_err());
        assert!(ClientEvent::from_text("not json").is_err());
    }

    #[test]
    fn test_update_state_accepts_one_or_many() {
        let update = PoseUpdate {
            id: UserId::new(),
            position: Vec3::new(1.0, 2.0, 3.0),
            target: Vec3::ZERO,
            orbit: Spherical::new(10.0, 1.0, -0.5),
        };
        let one: PoseUpdates = serde_json::from_value(serde_json::to_value(update).unwrap()).unwrap();
        assert_eq!(one.into_vec(), vec![update]);

        let many: PoseUpdates =
            serde_json::from_value(serde_json::to_value(vec![update, update]).unwrap()).unwrap();
        assert_eq!(many.into_vec().len(), 2);
    }

    #[test]
    fn test_pose_update_rejects_malformed() {
        assert!(PoseUpdate::from_value(json!({"id": "nope"})).is_err());
        assert!(PoseUpdate::from_value(json!(42)).is_err());
    }

    #[test]
    fn test_pose_update_reconstructs_pose() {
        let pose = CameraPose::looking_at(Vec3::new(0.0, 5.0, 10.0), Vec3::new(0.0, 2.0, 0.0));
        let update = PoseUpdate::new(UserId::new(), &pose, Spherical::new(10.0, 1.0, 0.0));
        let rebuilt = update.pose();
        assert_eq!(rebuilt.position, pose.position);
        assert!((rebuilt.forward() - pose.forward()).length() < 1e-5);
    }
}
