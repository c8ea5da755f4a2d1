//! The task driving one WebSocket link, with reconnection.

use std::time::Duration;

use futures::{Sink, SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::{self, Message};
use tracing::{debug, error, info, warn};

use crate::error::RealtimeError;
use crate::events::{ClientEvent, ServerEvent};
use crate::manager::{ConnectionManager, ConnectionState};
use crate::packet::{EnginePacket, SocketPacket};

/// Why a session ended without an error.
enum SessionEnd {
    /// The link was dropped; stop for good.
    Closed,
    /// The server or transport went away; reconnect.
    Lost,
}

/// Keep a link alive until it is replaced or destroyed.
pub(crate) async fn run(
    manager: ConnectionManager,
    generation: u64,
    user_id: String,
    token: String,
    mut outbound: mpsc::UnboundedReceiver<ClientEvent>,
) {
    let reconnect = manager.config().reconnect.clone();
    let mut attempts = 0u32;

    loop {
        if !manager.set_state(generation, ConnectionState::Connecting) {
            return;
        }

        match session(&manager, generation, &user_id, &token, &mut outbound, &mut attempts).await {
            Ok(SessionEnd::Closed) => {
                debug!(generation, "Realtime link closed");
                return;
            }
            Ok(SessionEnd::Lost) => warn!(generation, "Realtime connection lost"),
            Err(e) => warn!(generation, error = %e, "Realtime connection failed"),
        }

        if !manager.set_state(generation, ConnectionState::Disconnected) {
            return;
        }
        if !reconnect.allows(attempts) {
            error!(attempts, "Giving up on realtime connection");
            return;
        }

        let delay = reconnect.delay(attempts);
        attempts += 1;
        info!(attempt = attempts, delay_ms = delay.as_millis() as u64, "Reconnecting");

        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = wait_closed(&mut outbound) => return,
        }
    }
}

/// Resolve once every sender is gone, discarding stale events.
async fn wait_closed(outbound: &mut mpsc::UnboundedReceiver<ClientEvent>) {
    while outbound.recv().await.is_some() {}
}

async fn session(
    manager: &ConnectionManager,
    generation: u64,
    user_id: &str,
    token: &str,
    outbound: &mut mpsc::UnboundedReceiver<ClientEvent>,
    attempts: &mut u32,
) -> Result<SessionEnd, RealtimeError> {
    let config = manager.config();
    let url = config.websocket_url();
    debug!(url = %url, "Opening WebSocket");

    let (ws, _) = tokio::time::timeout(config.connect_timeout, connect_async(url.as_str()))
        .await
        .map_err(|_| RealtimeError::ConnectTimeout)??;
    let (mut ws_tx, mut ws_rx) = ws.split();

    let heartbeat = tokio::time::sleep(config.connect_timeout);
    tokio::pin!(heartbeat);
    let mut heartbeat_window = config.connect_timeout;
    let mut joined = false;

    loop {
        tokio::select! {
            frame = ws_rx.next() => {
                let text = match frame {
                    None => return Ok(SessionEnd::Lost),
                    Some(Err(e)) => return Err(e.into()),
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) => return Ok(SessionEnd::Lost),
                    Some(Ok(_)) => continue,
                };

                let packet = match EnginePacket::decode(text.as_str()) {
                    Ok(packet) => packet,
                    Err(e) => {
                        debug!(error = %e, "Ignoring malformed frame");
                        continue;
                    }
                };

                match packet {
                    EnginePacket::Open(info) => {
                        heartbeat_window =
                            Duration::from_millis(info.ping_interval + info.ping_timeout);
                        heartbeat.as_mut().reset(Instant::now() + heartbeat_window);
                        debug!(sid = %info.sid, "Engine open");
                        let auth = json!({ "token": token, "userId": user_id });
                        send(&mut ws_tx, EnginePacket::Message(SocketPacket::Connect(Some(auth))))
                            .await?;
                    }
                    EnginePacket::Ping => {
                        heartbeat.as_mut().reset(Instant::now() + heartbeat_window);
                        send(&mut ws_tx, EnginePacket::Pong).await?;
                    }
                    EnginePacket::Close => return Ok(SessionEnd::Lost),
                    EnginePacket::Message(SocketPacket::Connect(_)) => {
                        let Some(events) = manager.handshake(generation) else {
                            return Ok(SessionEnd::Closed);
                        };
                        info!(user_id, rooms = events.len() - 1, "Realtime connected");
                        *attempts = 0;
                        joined = true;
                        for event in events {
                            send_event(&mut ws_tx, &event).await?;
                        }
                    }
                    EnginePacket::Message(SocketPacket::ConnectError(data)) => {
                        return Err(RealtimeError::ConnectRefused(refusal_message(&data)));
                    }
                    EnginePacket::Message(SocketPacket::Disconnect) => {
                        info!("Server closed the realtime session");
                        return Ok(SessionEnd::Lost);
                    }
                    EnginePacket::Message(SocketPacket::Event { name, payload }) => {
                        match ServerEvent::decode(&name, payload) {
                            Ok(event) => {
                                debug!(event = %name, "Realtime event");
                                if !manager.publish(generation, event) {
                                    debug!(generation, "Link replaced, closing stale session");
                                    let _ = ws_tx.close().await;
                                    return Ok(SessionEnd::Closed);
                                }
                            }
                            Err(e) => warn!(event = %name, error = %e, "Dropping undecodable event"),
                        }
                    }
                    other => debug!(packet = ?other, "Ignoring packet"),
                }
            }
            event = outbound.recv() => {
                let Some(event) = event else {
                    let _ = send(&mut ws_tx, EnginePacket::Message(SocketPacket::Disconnect)).await;
                    let _ = ws_tx.close().await;
                    return Ok(SessionEnd::Closed);
                };
                if joined {
                    send_event(&mut ws_tx, &event).await?;
                } else {
                    // Rooms are re-joined in the handshake.
                    debug!(event = event.name(), "Dropping event sent before connect");
                }
            }
            _ = &mut heartbeat => return Err(RealtimeError::HeartbeatTimeout),
        }
    }
}

async fn send<S>(sink: &mut S, packet: EnginePacket) -> Result<(), RealtimeError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    sink.send(Message::Text(packet.encode().into())).await?;
    Ok(())
}

async fn send_event<S>(sink: &mut S, event: &ClientEvent) -> Result<(), RealtimeError>
where
    S: Sink<Message, Error = tungstenite::Error> + Unpin,
{
    debug!(event = event.name(), "Emitting");
    send(
        sink,
        EnginePacket::Message(SocketPacket::event(event.name(), event.payload())),
    )
    .await
}

fn refusal_message(data: &Value) -> String {
    data.get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| data.to_string())
}
