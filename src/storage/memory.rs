//! In-memory user store.

use crate::models::User;
use crate::storage::traits::{UpsertSummary, UserStore};
use crate::{Error, Result};
use std::collections::BTreeMap;

/// User store backed by a `BTreeMap`, ordered by id.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    users: BTreeMap<String, User>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            users: BTreeMap::new(),
        }
    }

    /// Creates a store holding `users`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] if a user has an empty id.
    pub fn with_users(users: &[User]) -> Result<Self> {
        let mut store = Self::new();
        store.upsert_users(users)?;
        Ok(store)
    }
}

/// Rejects a batch containing a user without an id.
pub(crate) fn check_batch(users: &[User]) -> Result<()> {
    match users.iter().position(|u| u.id.is_empty()) {
        Some(index) => Err(Error::InvalidInput(format!(
            "user {index} in batch has an empty id"
        ))),
        None => Ok(()),
    }
}

impl UserStore for MemoryStore {
    fn all_users(&self) -> Result<Vec<User>> {
        Ok(self.users.values().cloned().collect())
    }

    fn upsert_users(&mut self, users: &[User]) -> Result<UpsertSummary> {
        check_batch(users)?;

        let mut summary = UpsertSummary::default();
        for user in users {
            if self.users.insert(user.id.clone(), user.clone()).is_some() {
                summary.updated += 1;
            } else {
                summary.inserted += 1;
            }
        }
        Ok(summary)
    }

    fn delete_user(&mut self, id: &str) -> Result<bool> {
        Ok(self.users.remove(id).is_some())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.users.get(id).cloned())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.users.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_and_get() {
        let mut store = MemoryStore::new();
        let summary = store
            .upsert_users(&[User::new("b"), User::new("a").with_display_name("Ann")])
            .unwrap();

        assert_eq!(summary, UpsertSummary { inserted: 2, updated: 0 });
        assert_eq!(store.count().unwrap(), 2);
        assert_eq!(store.get_user("a").unwrap().unwrap().display_name, "Ann");
        assert!(store.get_user("c").unwrap().is_none());
    }

    #[test]
    fn test_all_users_ordered_by_id() {
        let store = MemoryStore::with_users(&[User::new("z"), User::new("a"), User::new("m")])
            .unwrap();
        let ids: Vec<_> = store.all_users().unwrap().into_iter().map(|u| u.id).collect();
        assert_eq!(ids, ["a", "m", "z"]);
    }

    #[test]
    fn test_upsert_replaces_and_last_wins() {
        let mut store = MemoryStore::with_users(&[User::new("a")]).unwrap();
        let summary = store
            .upsert_users(&[
                User::new("a").with_visit_count(1),
                User::new("a").with_visit_count(2),
            ])
            .unwrap();

        assert_eq!(summary.total(), 2);
        assert_eq!(summary.updated, 2);
        assert_eq!(store.get_user("a").unwrap().unwrap().visit_count, 2);
    }

    #[test]
    fn test_invalid_batch_leaves_store_unchanged() {
        let mut store = MemoryStore::with_users(&[User::new("a")]).unwrap();
        let result = store.upsert_users(&[User::new("b"), User::new("")]);

        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_delete() {
        let mut store = MemoryStore::with_users(&[User::new("a")]).unwrap();
        assert!(store.delete_user("a").unwrap());
        assert!(!store.delete_user("a").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }
}
