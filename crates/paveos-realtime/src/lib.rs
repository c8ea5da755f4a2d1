//! Realtime channel for PaveOS.
//!
//! The backend pushes conversation and lead updates over Socket.IO. This
//! crate provides:
//!
//! - A minimal Engine.IO v4 / Socket.IO v5 codec over WebSocket
//! - [`ConnectionManager`], the single process-wide connection with
//!   create/get/destroy, automatic reconnection and state watching
//! - Room subscriptions that are re-joined on every (re)connect and left
//!   when their [`RoomGuard`] is dropped
//!
//! # Example
//!
//! ```no_run
//! use paveos_realtime::{ConnectionManager, Room, ServerEvent, SocketConfig};
//!
//! # async fn example() {
//! let manager = ConnectionManager::new(SocketConfig::new("http://localhost:5000"));
//! manager.create("user-1", "access-token");
//!
//! let mut events = manager.subscribe();
//! let _room = manager.join(Room::lead("L1"));
//!
//! while let Ok(event) = events.recv().await {
//!     if let ServerEvent::NewMessage(message) = event {
//!         println!("{}", message.content);
//!     }
//! }
//! # }
//! ```

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod packet;

mod connection;
mod rooms;

#[cfg(any(test, feature = "test-util"))]
mod loopback;

pub use config::{ReconnectPolicy, SocketConfig};
pub use error::RealtimeError;
pub use events::{ClientEvent, LeadPatch, MessageRead, Room, ServerEvent};
pub use manager::{ConnectionInfo, ConnectionManager, ConnectionState, RoomGuard};

#[cfg(any(test, feature = "test-util"))]
pub use loopback::Loopback;
