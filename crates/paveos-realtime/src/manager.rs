//! The process-wide realtime connection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info};

use crate::config::SocketConfig;
use crate::connection;
use crate::events::{ClientEvent, Room, ServerEvent};
use crate::rooms::RoomRegistry;

/// Transport state of the current connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// Snapshot returned by [`ConnectionManager::get`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    pub user_id: String,
    pub state: ConnectionState,
}

/// The live link behind the manager. Dropping it closes the outbound
/// channel, which tells the connection task to disconnect and stop.
struct Link {
    user_id: String,
    outbound: mpsc::UnboundedSender<ClientEvent>,
    generation: u64,
}

struct Shared {
    config: SocketConfig,
    events: broadcast::Sender<ServerEvent>,
    state: watch::Sender<ConnectionState>,
    rooms: Mutex<RoomRegistry>,
    link: Mutex<Option<Link>>,
    generation: AtomicU64,
}

/// Owns at most one realtime connection at a time.
///
/// Cloning is cheap; every clone refers to the same connection, listener
/// set and room registry. Lock order is rooms before link.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

impl ConnectionManager {
    pub fn new(config: SocketConfig) -> Self {
        let (events, _) = broadcast::channel(config.event_buffer.max(1));
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            shared: Arc::new(Shared {
                config,
                events,
                state,
                rooms: Mutex::new(RoomRegistry::default()),
                link: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &SocketConfig {
        &self.shared.config
    }

    /// Replace any existing connection with a new one for `user_id`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn create(&self, user_id: &str, token: &str) {
        let (generation, outbound) = self.install_link(user_id);
        info!(user_id, generation, "Creating realtime connection");
        tokio::spawn(connection::run(
            self.clone(),
            generation,
            user_id.to_string(),
            token.to_string(),
            outbound,
        ));
    }

    /// Current connection, if one has been created.
    pub fn get(&self) -> Option<ConnectionInfo> {
        let link = self.shared.link.lock();
        link.as_ref().map(|link| ConnectionInfo {
            user_id: link.user_id.clone(),
            state: *self.shared.state.borrow(),
        })
    }

    /// Close and forget the current connection.
    pub fn destroy(&self) {
        let previous = {
            let mut link = self.shared.link.lock();
            let previous = link.take();
            self.shared.state.send_replace(ConnectionState::Disconnected);
            previous
        };
        if let Some(link) = previous {
            info!(user_id = %link.user_id, "Destroying realtime connection");
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Attach a listener for server events. Dropping the receiver detaches it.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.shared.events.subscribe()
    }

    /// Join a room for as long as the returned guard lives.
    ///
    /// The join is sent immediately when connected and re-sent after every
    /// reconnect.
    pub fn join(&self, room: Room) -> RoomGuard {
        let mut rooms = self.shared.rooms.lock();
        if rooms.acquire(room.clone()) {
            debug!(?room, "Joining room");
            self.emit(room.join_event());
        }
        drop(rooms);
        RoomGuard {
            manager: self.clone(),
            room,
        }
    }

    /// Rooms currently held by at least one guard.
    pub fn active_rooms(&self) -> Vec<Room> {
        self.shared.rooms.lock().rooms()
    }

    /// Send an event if the connection is up. Returns whether it was queued.
    pub fn emit(&self, event: ClientEvent) -> bool {
        if !self.is_connected() {
            debug!(event = event.name(), "Not connected, dropping outbound event");
            return false;
        }
        let link = self.shared.link.lock();
        match link.as_ref() {
            Some(link) => link.outbound.send(event).is_ok(),
            None => false,
        }
    }

    fn leave(&self, room: &Room) {
        let mut rooms = self.shared.rooms.lock();
        if rooms.release(room) {
            debug!(?room, "Leaving room");
            self.emit(room.leave_event());
        }
    }

    /// Install a fresh link, dropping the previous one.
    pub(crate) fn install_link(
        &self,
        user_id: &str,
    ) -> (u64, mpsc::UnboundedReceiver<ClientEvent>) {
        let (outbound, receiver) = mpsc::unbounded_channel();
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let previous = {
            let mut link = self.shared.link.lock();
            let previous = link.replace(Link {
                user_id: user_id.to_string(),
                outbound,
                generation,
            });
            self.shared.state.send_replace(ConnectionState::Connecting);
            previous
        };
        if let Some(previous) = previous {
            debug!(
                user_id = %previous.user_id,
                generation = previous.generation,
                "Replacing realtime connection"
            );
        }
        (generation, receiver)
    }

    /// Mark the link connected and return the events that must follow:
    /// `join-user` then one join per active room.
    ///
    /// Returns `None` if the link has been replaced or destroyed.
    pub(crate) fn handshake(&self, generation: u64) -> Option<Vec<ClientEvent>> {
        let rooms = self.shared.rooms.lock();
        let link = self.shared.link.lock();
        let link = link.as_ref().filter(|link| link.generation == generation)?;

        self.shared.state.send_replace(ConnectionState::Connected);

        let mut events = vec![ClientEvent::JoinUser {
            user_id: link.user_id.clone(),
        }];
        events.extend(rooms.rooms().iter().map(Room::join_event));
        Some(events)
    }

    /// Update the state on behalf of a link. Stale links are ignored.
    pub(crate) fn set_state(&self, generation: u64, state: ConnectionState) -> bool {
        let link = self.shared.link.lock();
        match link.as_ref() {
            Some(link) if link.generation == generation => {
                self.shared.state.send_replace(state);
                true
            }
            _ => false,
        }
    }

    /// Fan a server event from link `generation` out to every listener.
    ///
    /// Events from a replaced or destroyed link are dropped and `false` is
    /// returned. The link lock is held across the send so a concurrent
    /// `destroy` or `create` cannot interleave.
    pub(crate) fn publish(&self, generation: u64, event: ServerEvent) -> bool {
        let link = self.shared.link.lock();
        if !link.as_ref().is_some_and(|link| link.generation == generation) {
            debug!(generation, event = event.name(), "Dropping event from stale link");
            return false;
        }
        // No listeners is fine.
        let _ = self.shared.events.send(event);
        true
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("url", &self.shared.config.url)
            .field("state", &self.state())
            .finish()
    }
}

/// Membership in a room. Dropping it leaves the room once no other guard
/// holds it.
#[must_use = "dropping the guard leaves the room"]
pub struct RoomGuard {
    manager: ConnectionManager,
    room: Room,
}

impl RoomGuard {
    pub fn room(&self) -> &Room {
        &self.room
    }
}

impl std::fmt::Debug for RoomGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("RoomGuard").field(&self.room).finish()
    }
}

impl Drop for RoomGuard {
    fn drop(&mut self) {
        self.manager.leave(&self.room);
    }
}
