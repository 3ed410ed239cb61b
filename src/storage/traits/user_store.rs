//! User store trait.

use crate::Result;
use crate::models::User;

/// Counts from an upsert batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Users whose id was not present before.
    pub inserted: usize,
    /// Users that replaced an existing record.
    pub updated: usize,
}

impl UpsertSummary {
    /// Total number of users written.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

/// Trait for user persistence backends.
///
/// Stores are keyed by [`User::id`]. Writes are all-or-nothing: a batch that
/// fails leaves the store as it was.
pub trait UserStore: Send + Sync {
    /// Returns every stored user, ordered by id.
    fn all_users(&self) -> Result<Vec<User>>;

    /// Inserts or replaces users by id.
    ///
    /// Later entries in `users` win over earlier entries with the same id.
    fn upsert_users(&mut self, users: &[User]) -> Result<UpsertSummary>;

    /// Deletes a user by id. Returns whether it existed.
    fn delete_user(&mut self, id: &str) -> Result<bool>;

    /// Retrieves a user by id.
    fn get_user(&self, id: &str) -> Result<Option<User>> {
        Ok(self.all_users()?.into_iter().find(|u| u.id == id))
    }

    /// Returns the number of stored users.
    fn count(&self) -> Result<usize> {
        Ok(self.all_users()?.len())
    }
}
