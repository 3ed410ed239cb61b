//! Point-in-time copies of the user list.

use super::User;
use crate::Result;
use crate::storage::UserStore;
use chrono::{DateTime, Local};

/// An immutable, ordered copy of every user taken at one instant.
///
/// Exports only ever see a snapshot, never the live store.
#[derive(Debug, Clone)]
pub struct Snapshot {
    users: Vec<User>,
    taken_at: DateTime<Local>,
}

impl Snapshot {
    /// Takes a snapshot of all users currently in `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub fn capture(store: &dyn UserStore) -> Result<Self> {
        let users = store.all_users()?;
        tracing::debug!(count = users.len(), "Captured user snapshot");
        Ok(Self::from_records(users))
    }

    /// Wraps an already loaded list, stamped with the current time.
    #[must_use]
    pub fn from_records(users: Vec<User>) -> Self {
        Self::taken_at(users, Local::now())
    }

    /// Wraps a list with an explicit timestamp.
    #[must_use]
    pub const fn taken_at(users: Vec<User>, taken_at: DateTime<Local>) -> Self {
        Self { users, taken_at }
    }

    /// The users, in snapshot order.
    #[must_use]
    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// When the snapshot was taken.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Local> {
        self.taken_at
    }

    /// Number of users captured.
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the snapshot holds no users.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    #[test]
    fn test_capture_is_detached_from_store() {
        let mut store = MemoryStore::new();
        store.upsert_users(&[User::new("a")]).unwrap();

        let snapshot = Snapshot::capture(&store).unwrap();
        store.upsert_users(&[User::new("b")]).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.users()[0].id, "a");
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = Snapshot::from_records(Vec::new());
        assert!(snapshot.is_empty());
    }
}
