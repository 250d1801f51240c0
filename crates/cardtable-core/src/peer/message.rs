//! Wire message exchanged between peers.

use super::PeerError;
use crate::shapes::Shape;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Message type carrying a full snapshot of the sender's shapes.
pub const SHAPES: &str = "shapes";
/// Message type announcing the sender's endpoint id after connecting.
pub const CONNECTED: &str = "connected";

/// A typed message: `{"type": "...", "payload": ...}`.
///
/// The payload is free-form; receivers decode it with [`PeerMessage::payload_as`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

/// Payload of a [`CONNECTED`] message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub peer_id: String,
}

impl PeerMessage {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Snapshot of the local shape list.
    pub fn shapes(shapes: &[Shape]) -> Result<Self, PeerError> {
        Ok(Self::new(SHAPES, serde_json::to_value(shapes)?))
    }

    /// Announce our endpoint id to the peer we just connected to.
    pub fn connected(peer_id: &str) -> Self {
        Self::new(CONNECTED, json!({ "peerId": peer_id }))
    }

    /// Parse a text frame.
    ///
    /// Anything that is not a JSON object with a string `type` and a
    /// `payload` field is rejected.
    pub fn parse(text: &str) -> Result<Self, PeerError> {
        let value: Value =
            serde_json::from_str(text).map_err(|e| PeerError::InvalidMessage(e.to_string()))?;
        let Value::Object(mut object) = value else {
            return Err(PeerError::InvalidMessage("not a JSON object".to_string()));
        };
        let kind = match object.remove("type") {
            Some(Value::String(kind)) => kind,
            Some(_) => return Err(PeerError::InvalidMessage("`type` is not a string".to_string())),
            None => return Err(PeerError::InvalidMessage("missing `type`".to_string())),
        };
        let payload = object
            .remove("payload")
            .ok_or_else(|| PeerError::InvalidMessage("missing `payload`".to_string()))?;
        Ok(Self { kind, payload })
    }

    /// Encode as a text frame.
    pub fn to_text(&self) -> Result<String, PeerError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode the payload into a concrete type.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T, PeerError> {
        serde_json::from_value(self.payload.clone())
            .map_err(|e| PeerError::InvalidMessage(format!("bad `{}` payload: {e}", self.kind)))
    }
}
