//! Event channel message types
//!
//! Shared between the backend and all client sessions, for both
//! in-process (memory) and network (TCP/TLS) transports. The channel
//! is pure pub/sub with at-most-once delivery; there is no
//! request/response correlation.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use uuid::Uuid;

pub mod payload;
pub use payload::*;

/// Protocol version
pub const PROTOCOL_VERSION: u16 = 1;

/// Named channel events.
///
/// Wire names follow the backend's event naming (see [`fmt::Display`]).
/// `Join`..`CallWaiter` are client-emitted; the rest are server pushes,
/// except `CartUpdated`/`CartCleared`/`UserProfileUpdated` which travel
/// both ways (the backend echoes them to every session of the same
/// identity, origin included, for multi-tab convergence).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventName {
    /// Join the identity-scoped room
    Join = 0,
    /// Full cart snapshot for an identity
    CartUpdated = 1,
    /// Cart emptied (distinct from an empty snapshot, which is
    /// ambiguous with "not yet loaded")
    CartCleared = 2,
    /// Profile replaced
    UserProfileUpdated = 3,
    /// Rider location sample (rider -> server)
    UpdateRiderLocation = 4,
    /// Table-side service call
    CallWaiter = 5,
    /// A new order was confirmed for this identity
    NewOrder = 6,
    /// An existing order changed (status, rider, pings)
    OrderUpdated = 7,
    ProductCreated = 8,
    ProductUpdated = 9,
    ProductDeleted = 10,
    SettingsUpdated = 11,
    /// Rider location broadcast (server -> interested clients)
    RiderLocationUpdated = 12,
    /// Customer location sharing broadcast
    UserLocationUpdated = 13,
}

impl TryFrom<u8> for EventName {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(EventName::Join),
            1 => Ok(EventName::CartUpdated),
            2 => Ok(EventName::CartCleared),
            3 => Ok(EventName::UserProfileUpdated),
            4 => Ok(EventName::UpdateRiderLocation),
            5 => Ok(EventName::CallWaiter),
            6 => Ok(EventName::NewOrder),
            7 => Ok(EventName::OrderUpdated),
            8 => Ok(EventName::ProductCreated),
            9 => Ok(EventName::ProductUpdated),
            10 => Ok(EventName::ProductDeleted),
            11 => Ok(EventName::SettingsUpdated),
            12 => Ok(EventName::RiderLocationUpdated),
            13 => Ok(EventName::UserLocationUpdated),
            _ => Err(()),
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventName::Join => write!(f, "join"),
            EventName::CartUpdated => write!(f, "cartUpdated"),
            EventName::CartCleared => write!(f, "cartCleared"),
            EventName::UserProfileUpdated => write!(f, "userProfileUpdated"),
            EventName::UpdateRiderLocation => write!(f, "updateRiderLocation"),
            EventName::CallWaiter => write!(f, "callWaiter"),
            EventName::NewOrder => write!(f, "newOrder"),
            EventName::OrderUpdated => write!(f, "orderUpdated"),
            EventName::ProductCreated => write!(f, "productCreated"),
            EventName::ProductUpdated => write!(f, "productUpdated"),
            EventName::ProductDeleted => write!(f, "productDeleted"),
            EventName::SettingsUpdated => write!(f, "settingsUpdated"),
            EventName::RiderLocationUpdated => write!(f, "riderLocationUpdated"),
            EventName::UserLocationUpdated => write!(f, "userLocationUpdated"),
        }
    }
}

/// Channel message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub request_id: Uuid,
    pub event: EventName,
    /// JSON-encoded payload
    pub payload: Vec<u8>,
}

impl ChannelMessage {
    pub fn new(event: EventName, payload: Vec<u8>) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            event,
            payload,
        }
    }

    /// Encode a typed payload into a message.
    pub fn encode<T: Serialize>(event: EventName, payload: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(event, serde_json::to_vec(payload)?))
    }

    /// Decode the payload as the given type.
    pub fn parse_payload<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tag_round_trip() {
        for tag in 0u8..=13 {
            let event = EventName::try_from(tag).unwrap();
            assert_eq!(event as u8, tag);
        }
        assert!(EventName::try_from(14).is_err());
    }

    #[test]
    fn test_encode_parse_round_trip() {
        let msg = ChannelMessage::encode(
            EventName::Join,
            &JoinPayload {
                email: "ada@example.com".to_string(),
            },
        )
        .unwrap();

        assert_eq!(msg.event, EventName::Join);
        let parsed: JoinPayload = msg.parse_payload().unwrap();
        assert_eq!(parsed.email, "ada@example.com");
    }
}
