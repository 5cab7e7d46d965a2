//! Occupancy resolution — who is assumed to have entered the room.
//!
//! The device only reports presence, not identity. Picking the entrant is a
//! strategy so that a real identity signal can be plugged in later without
//! touching the state store.

use roomwatch_domain::id::UserId;
use roomwatch_domain::user::{Directory, User};

/// Chooses the occupant pushed onto the stack when presence starts.
pub trait OccupancyResolver: Send + Sync {
    /// Resolve the user who just entered.
    ///
    /// `current` is the occupant stack before the push, most recent last.
    fn resolve_entrant(&self, directory: &Directory, current: &[UserId]) -> User;
}

/// Always picks the directory's first entry (or a guest when empty).
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstDirectoryEntry;

impl OccupancyResolver for FirstDirectoryEntry {
    fn resolve_entrant(&self, directory: &Directory, _current: &[UserId]) -> User {
        directory.first().cloned().unwrap_or_else(User::guest)
    }
}
