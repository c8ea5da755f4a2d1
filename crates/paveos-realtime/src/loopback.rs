//! In-process link standing in for the WebSocket.

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::events::{ClientEvent, ServerEvent};
use crate::manager::{ConnectionManager, ConnectionState};

/// Test handle for a manager whose connection is driven by hand.
pub struct Loopback {
    manager: ConnectionManager,
    generation: u64,
    outbound: Mutex<mpsc::UnboundedReceiver<ClientEvent>>,
    emitted: Mutex<Vec<ClientEvent>>,
}

impl ConnectionManager {
    /// Replace the connection with a loopback link for `user_id`.
    ///
    /// The link starts in `Connecting`; call [`Loopback::connect`] to
    /// complete the handshake.
    pub fn loopback(&self, user_id: &str) -> Loopback {
        let (generation, outbound) = self.install_link(user_id);
        Loopback {
            manager: self.clone(),
            generation,
            outbound: Mutex::new(outbound),
            emitted: Mutex::new(Vec::new()),
        }
    }
}

impl Loopback {
    /// Complete a (re)connect, recording the handshake events.
    pub fn connect(&self) {
        if let Some(events) = self.manager.handshake(self.generation) {
            self.drain();
            self.emitted.lock().extend(events);
        }
    }

    /// Simulate the transport dropping.
    pub fn disconnect(&self) {
        self.drain();
        self.manager
            .set_state(self.generation, ConnectionState::Disconnected);
    }

    /// Push a server event to every listener. Returns `false` once this
    /// link has been replaced or destroyed.
    pub fn deliver(&self, event: ServerEvent) -> bool {
        self.manager.publish(self.generation, event)
    }

    /// Every event the client has sent over this link, in order.
    pub fn emitted(&self) -> Vec<ClientEvent> {
        self.drain();
        self.emitted.lock().clone()
    }

    /// Forget the recorded events.
    pub fn clear(&self) {
        self.drain();
        self.emitted.lock().clear();
    }

    fn drain(&self) {
        let mut outbound = self.outbound.lock();
        let mut emitted = self.emitted.lock();
        while let Ok(event) = outbound.try_recv() {
            emitted.push(event);
        }
    }
}
