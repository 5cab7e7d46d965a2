//! User directory — a flat, read-only mapping of known users.
//!
//! The directory is treated as an opaque service: the device has no
//! per-user sensing, so it is only used to give occupants a name.

use serde::{Deserialize, Serialize};

use crate::id::UserId;

/// A known user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
}

impl User {
    /// Create a user.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            name: name.into(),
        }
    }

    /// Placeholder occupant used when the directory is empty.
    #[must_use]
    pub fn guest() -> Self {
        Self::new("guest", "Guest")
    }
}

/// Ordered list of known users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Directory {
    users: Vec<User>,
}

impl Directory {
    /// Build a directory, preserving order. Later duplicates of an id are ignored.
    #[must_use]
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        let mut deduped: Vec<User> = Vec::new();
        for user in users {
            if !deduped.iter().any(|known| known.id == user.id) {
                deduped.push(user);
            }
        }
        Self { users: deduped }
    }

    /// First registered user, if any.
    #[must_use]
    pub fn first(&self) -> Option<&User> {
        self.users.first()
    }

    /// Look up a user by id.
    #[must_use]
    pub fn get(&self, id: &UserId) -> Option<&User> {
        self.users.iter().find(|user| &user.id == id)
    }

    /// Display name for `id`, falling back to the raw id.
    #[must_use]
    pub fn display_name(&self, id: &UserId) -> String {
        self.get(id)
            .map_or_else(|| id.to_string(), |user| user.name.clone())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }
}
