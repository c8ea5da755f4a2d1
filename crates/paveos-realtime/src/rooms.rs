//! Reference-counted registry of active room subscriptions.

use indexmap::IndexMap;

use crate::events::Room;

/// Rooms the client wants to be in, whether or not the socket is up.
#[derive(Debug, Default)]
pub(crate) struct RoomRegistry {
    rooms: IndexMap<Room, usize>,
}

impl RoomRegistry {
    /// Register interest. Returns true when this is the first holder.
    pub fn acquire(&mut self, room: Room) -> bool {
        let holders = self.rooms.entry(room).or_insert(0);
        *holders += 1;
        *holders == 1
    }

    /// Drop interest. Returns true when the last holder left.
    pub fn release(&mut self, room: &Room) -> bool {
        match self.rooms.get_mut(room) {
            Some(holders) if *holders > 1 => {
                *holders -= 1;
                false
            }
            Some(_) => {
                self.rooms.shift_remove(room);
                true
            }
            None => false,
        }
    }

    /// Active rooms in the order they were first joined.
    pub fn rooms(&self) -> Vec<Room> {
        self.rooms.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acquire_release_counts_holders() {
        let mut registry = RoomRegistry::default();
        let room = Room::lead("L1");

        assert!(registry.acquire(room.clone()));
        assert!(!registry.acquire(room.clone()));
        assert!(!registry.release(&room));
        assert_eq!(registry.rooms(), vec![room.clone()]);
        assert!(registry.release(&room));
        assert!(registry.rooms().is_empty());
        assert!(!registry.release(&room));
    }

    #[test]
    fn test_rooms_keep_join_order() {
        let mut registry = RoomRegistry::default();
        registry.acquire(Room::lead("L2"));
        registry.acquire(Room::discord("9", "L2"));
        registry.acquire(Room::lead("L1"));
        registry.release(&Room::discord("9", "L2"));

        assert_eq!(registry.rooms(), vec![Room::lead("L2"), Room::lead("L1")]);
    }
}
