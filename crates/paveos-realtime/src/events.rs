//! Typed realtime events and rooms.

use paveos_api::Message;
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::error::RealtimeError;

/// A logical subscription channel on the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Room {
    /// Updates scoped to one lead.
    Lead { lead_id: String },
    /// Chat-platform traffic for a lead's linked Discord identity.
    Discord {
        discord_user_id: String,
        lead_id: String,
    },
}

impl Room {
    pub fn lead(lead_id: impl Into<String>) -> Self {
        Room::Lead {
            lead_id: lead_id.into(),
        }
    }

    pub fn discord(discord_user_id: impl Into<String>, lead_id: impl Into<String>) -> Self {
        Room::Discord {
            discord_user_id: discord_user_id.into(),
            lead_id: lead_id.into(),
        }
    }

    /// Event that subscribes to this room.
    pub fn join_event(&self) -> ClientEvent {
        match self {
            Room::Lead { lead_id } => ClientEvent::LeadJoin {
                lead_id: lead_id.clone(),
            },
            Room::Discord {
                discord_user_id,
                lead_id,
            } => ClientEvent::DiscordJoin {
                discord_user_id: discord_user_id.clone(),
                lead_id: lead_id.clone(),
            },
        }
    }

    /// Event that unsubscribes from this room.
    pub fn leave_event(&self) -> ClientEvent {
        match self {
            Room::Lead { lead_id } => ClientEvent::LeadLeave {
                lead_id: lead_id.clone(),
            },
            Room::Discord {
                discord_user_id,
                lead_id,
            } => ClientEvent::DiscordLeave {
                discord_user_id: discord_user_id.clone(),
                lead_id: lead_id.clone(),
            },
        }
    }
}

/// Events the client emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Connect-time handshake binding the socket to a user.
    JoinUser { user_id: String },
    LeadJoin { lead_id: String },
    LeadLeave { lead_id: String },
    DiscordJoin {
        discord_user_id: String,
        lead_id: String,
    },
    DiscordLeave {
        discord_user_id: String,
        lead_id: String,
    },
}

impl ClientEvent {
    /// Wire event name.
    pub fn name(&self) -> &'static str {
        match self {
            ClientEvent::JoinUser { .. } => "join-user",
            ClientEvent::LeadJoin { .. } => "lead:join",
            ClientEvent::LeadLeave { .. } => "lead:leave",
            ClientEvent::DiscordJoin { .. } => "discord:join",
            ClientEvent::DiscordLeave { .. } => "discord:leave",
        }
    }

    /// Wire payload.
    pub fn payload(&self) -> Value {
        match self {
            ClientEvent::JoinUser { user_id } => Value::String(user_id.clone()),
            ClientEvent::LeadJoin { lead_id } | ClientEvent::LeadLeave { lead_id } => {
                json!({ "leadId": lead_id })
            }
            ClientEvent::DiscordJoin {
                discord_user_id,
                lead_id,
            }
            | ClientEvent::DiscordLeave {
                discord_user_id,
                lead_id,
            } => json!({ "discordUserId": discord_user_id, "leadId": lead_id }),
        }
    }
}

/// `discord:messageRead` payload.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRead {
    pub lead_id: String,
    pub message_id: String,
}

/// `lead:updated` payload: the lead id plus whichever fields changed.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadPatch {
    pub id: String,
    pub fields: Map<String, Value>,
}

/// Events the server pushes.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// `discord:message`: a new incoming or outgoing message.
    NewMessage(Message),
    /// `discord:messageRead`: a message was marked read.
    MessageRead(MessageRead),
    /// `lead:updated`: a lead record changed.
    LeadUpdated(LeadPatch),
    /// Anything else the server sends.
    Other { name: String, payload: Value },
}

impl ServerEvent {
    /// Decode a named event payload.
    pub fn decode(name: &str, payload: Value) -> Result<Self, RealtimeError> {
        match name {
            "discord:message" => Ok(ServerEvent::NewMessage(serde_json::from_value(payload)?)),
            "discord:messageRead" => {
                Ok(ServerEvent::MessageRead(serde_json::from_value(payload)?))
            }
            "lead:updated" => {
                let Value::Object(fields) = payload else {
                    return Err(RealtimeError::Protocol(
                        "lead:updated payload is not an object".to_string(),
                    ));
                };
                let id = fields
                    .get("id")
                    .or_else(|| fields.get("_id"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| RealtimeError::Protocol("lead:updated without id".to_string()))?
                    .to_string();
                Ok(ServerEvent::LeadUpdated(LeadPatch { id, fields }))
            }
            _ => Ok(ServerEvent::Other {
                name: name.to_string(),
                payload,
            }),
        }
    }

    /// Wire event name.
    pub fn name(&self) -> &str {
        match self {
            ServerEvent::NewMessage(_) => "discord:message",
            ServerEvent::MessageRead(_) => "discord:messageRead",
            ServerEvent::LeadUpdated(_) => "lead:updated",
            ServerEvent::Other { name, .. } => name,
        }
    }

    /// Lead the event targets, when it names one.
    pub fn lead_id(&self) -> Option<&str> {
        match self {
            ServerEvent::NewMessage(message) => message.lead_id.as_deref(),
            ServerEvent::MessageRead(read) => Some(&read.lead_id),
            ServerEvent::LeadUpdated(patch) => Some(&patch.id),
            ServerEvent::Other { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_events() {
        let room = Room::discord("987", "L1");
        assert_eq!(room.join_event().name(), "discord:join");
        assert_eq!(
            room.leave_event().payload(),
            json!({"discordUserId": "987", "leadId": "L1"})
        );
        assert_eq!(Room::lead("L1").join_event().payload(), json!({"leadId": "L1"}));
    }

    #[test]
    fn test_join_user_payload_is_bare_id() {
        let event = ClientEvent::JoinUser {
            user_id: "u1".into(),
        };
        assert_eq!(event.payload(), json!("u1"));
    }

    #[test]
    fn test_decode_new_message() {
        let event = ServerEvent::decode(
            "discord:message",
            json!({
                "id": "m1",
                "leadId": "L1",
                "content": "hi",
                "direction": "incoming",
                "isRead": false,
                "createdAt": "2024-05-01T10:00:00Z"
            }),
        )
        .unwrap();
        assert_eq!(event.lead_id(), Some("L1"));
        assert!(matches!(event, ServerEvent::NewMessage(ref m) if m.id == "m1"));
    }

    #[test]
    fn test_decode_lead_updated() {
        let event =
            ServerEvent::decode("lead:updated", json!({"id": "L2", "status": "won"})).unwrap();
        match event {
            ServerEvent::LeadUpdated(patch) => {
                assert_eq!(patch.id, "L2");
                assert_eq!(patch.fields["status"], "won");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_decode_lead_updated_requires_id() {
        assert!(ServerEvent::decode("lead:updated", json!({"status": "won"})).is_err());
    }

    #[test]
    fn test_unknown_event_is_kept() {
        let event = ServerEvent::decode("notification:new", json!({"x": 1})).unwrap();
        assert_eq!(event.name(), "notification:new");
        assert_eq!(event.lead_id(), None);
    }
}
