//! Engine.IO v4 / Socket.IO v5 text framing.
//!
//! Only the default namespace and text frames are supported; binary
//! attachments are not used by the PaveOS server.

use serde::Deserialize;
use serde_json::Value;

use crate::error::RealtimeError;

/// Handshake sent by the server in the Engine.IO `open` packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenInfo {
    pub sid: String,
    /// Milliseconds between server pings.
    #[serde(default)]
    pub ping_interval: u64,
    /// Milliseconds the server waits for a pong.
    #[serde(default)]
    pub ping_timeout: u64,
}

/// Engine.IO transport packet.
#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(OpenInfo),
    Close,
    Ping,
    Pong,
    Message(SocketPacket),
    Upgrade,
    Noop,
}

/// Socket.IO packet carried inside an Engine.IO message.
#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    /// Client → server: connect with an auth payload.
    /// Server → client: connect ack carrying `{sid}`.
    Connect(Option<Value>),
    Disconnect,
    Event { name: String, payload: Value },
    Ack { id: u64, args: Vec<Value> },
    ConnectError(Value),
}

impl EnginePacket {
    /// Encode to a WebSocket text frame.
    pub fn encode(&self) -> String {
        match self {
            EnginePacket::Open(_) => "0".to_string(),
            EnginePacket::Close => "1".to_string(),
            EnginePacket::Ping => "2".to_string(),
            EnginePacket::Pong => "3".to_string(),
            EnginePacket::Message(packet) => format!("4{}", packet.encode()),
            EnginePacket::Upgrade => "5".to_string(),
            EnginePacket::Noop => "6".to_string(),
        }
    }

    /// Decode a WebSocket text frame.
    pub fn decode(frame: &str) -> Result<Self, RealtimeError> {
        let mut chars = frame.chars();
        let kind = chars
            .next()
            .ok_or_else(|| RealtimeError::Protocol("empty frame".to_string()))?;
        let rest = chars.as_str();

        match kind {
            '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
            '1' => Ok(EnginePacket::Close),
            '2' => Ok(EnginePacket::Ping),
            '3' => Ok(EnginePacket::Pong),
            '4' => Ok(EnginePacket::Message(SocketPacket::decode(rest)?)),
            '5' => Ok(EnginePacket::Upgrade),
            '6' => Ok(EnginePacket::Noop),
            other => Err(RealtimeError::Protocol(format!(
                "unknown engine packet type {other:?}"
            ))),
        }
    }
}

impl SocketPacket {
    /// Event packet for the default namespace.
    pub fn event(name: impl Into<String>, payload: Value) -> Self {
        SocketPacket::Event {
            name: name.into(),
            payload,
        }
    }

    fn encode(&self) -> String {
        match self {
            SocketPacket::Connect(None) => "0".to_string(),
            SocketPacket::Connect(Some(auth)) => format!("0{auth}"),
            SocketPacket::Disconnect => "1".to_string(),
            SocketPacket::Event { name, payload } => {
                let array = match payload {
                    Value::Null => Value::Array(vec![Value::String(name.clone())]),
                    payload => Value::Array(vec![Value::String(name.clone()), payload.clone()]),
                };
                format!("2{array}")
            }
            SocketPacket::Ack { id, args } => format!("3{id}{}", Value::Array(args.clone())),
            SocketPacket::ConnectError(data) => format!("4{data}"),
        }
    }

    fn decode(body: &str) -> Result<Self, RealtimeError> {
        let mut chars = body.chars();
        let kind = chars
            .next()
            .ok_or_else(|| RealtimeError::Protocol("empty socket packet".to_string()))?;
        let rest = skip_namespace(chars.as_str());

        match kind {
            '0' => {
                if rest.is_empty() {
                    Ok(SocketPacket::Connect(None))
                } else {
                    Ok(SocketPacket::Connect(Some(serde_json::from_str(rest)?)))
                }
            }
            '1' => Ok(SocketPacket::Disconnect),
            '2' => {
                let (_, json) = split_ack_id(rest);
                let mut items = match serde_json::from_str::<Value>(json)? {
                    Value::Array(items) => items.into_iter(),
                    _ => {
                        return Err(RealtimeError::Protocol(
                            "event payload is not an array".to_string(),
                        ))
                    }
                };
                let name = match items.next() {
                    Some(Value::String(name)) => name,
                    _ => {
                        return Err(RealtimeError::Protocol(
                            "event without a name".to_string(),
                        ))
                    }
                };
                let payload = items.next().unwrap_or(Value::Null);
                Ok(SocketPacket::Event { name, payload })
            }
            '3' => {
                let (id, json) = split_ack_id(rest);
                let id = id.ok_or_else(|| RealtimeError::Protocol("ack without id".to_string()))?;
                let args = match serde_json::from_str::<Value>(json)? {
                    Value::Array(items) => items,
                    other => vec![other],
                };
                Ok(SocketPacket::Ack { id, args })
            }
            '4' => {
                let data = if rest.is_empty() {
                    Value::Null
                } else {
                    serde_json::from_str(rest)?
                };
                Ok(SocketPacket::ConnectError(data))
            }
            other => Err(RealtimeError::Protocol(format!(
                "unsupported socket packet type {other:?}"
            ))),
        }
    }
}

/// Drop a `/namespace,` prefix. Only the default namespace is used.
fn skip_namespace(rest: &str) -> &str {
    if rest.starts_with('/') {
        match rest.find(',') {
            Some(idx) => &rest[idx + 1..],
            None => "",
        }
    } else {
        rest
    }
}

/// Split a leading numeric ack id from the JSON body.
fn split_ack_id(rest: &str) -> (Option<u64>, &str) {
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return (None, rest);
    }
    (rest[..digits].parse().ok(), &rest[digits..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_open() {
        let packet = EnginePacket::decode(
            r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#,
        )
        .unwrap();
        assert_eq!(
            packet,
            EnginePacket::Open(OpenInfo {
                sid: "abc".into(),
                ping_interval: 25000,
                ping_timeout: 20000,
            })
        );
    }

    #[test]
    fn test_ping_pong() {
        assert_eq!(EnginePacket::decode("2").unwrap(), EnginePacket::Ping);
        assert_eq!(EnginePacket::Pong.encode(), "3");
    }

    #[test]
    fn test_encode_connect_with_auth() {
        let auth = json!({"token": "t"});
        let frame = EnginePacket::Message(SocketPacket::Connect(Some(auth))).encode();
        assert_eq!(frame, r#"40{"token":"t"}"#);
    }

    #[test]
    fn test_decode_connect_ack() {
        let packet = EnginePacket::decode(r#"40{"sid":"xyz"}"#).unwrap();
        assert!(matches!(
            packet,
            EnginePacket::Message(SocketPacket::Connect(Some(_)))
        ));
    }

    #[test]
    fn test_encode_event() {
        let frame =
            EnginePacket::Message(SocketPacket::event("lead:join", json!({"leadId": "L1"}))).encode();
        assert_eq!(frame, r#"42["lead:join",{"leadId":"L1"}]"#);
    }

    #[test]
    fn test_decode_event_with_namespace_and_ack_id() {
        let packet = EnginePacket::decode(r#"42/,7["lead:updated",{"id":"L1"}]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                name: "lead:updated".into(),
                payload: json!({"id": "L1"}),
            })
        );
    }

    #[test]
    fn test_decode_event_without_payload() {
        let packet = EnginePacket::decode(r#"42["ping-me"]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                name: "ping-me".into(),
                payload: Value::Null,
            })
        );
    }

    #[test]
    fn test_decode_connect_error() {
        let packet = EnginePacket::decode(r#"44{"message":"Authentication error"}"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::ConnectError(json!({"message": "Authentication error"})))
        );
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(EnginePacket::decode("").is_err());
        assert!(EnginePacket::decode("9").is_err());
        assert!(EnginePacket::decode(r#"42{"not":"array"}"#).is_err());
    }
}
