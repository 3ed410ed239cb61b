//! The exported user record.

use serde::{Deserialize, Serialize};

/// A stored user.
///
/// Serialized keys are `userId`, `fullName` and `numCoffees`. They must stay
/// in step with [`crate::io::USER_SCHEMA`], which fixes their order for CSV.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    /// Natural key. Importing a user with an existing id updates it.
    #[serde(rename = "userId")]
    pub id: String,
    /// Name shown for the user; empty when unknown.
    #[serde(rename = "fullName")]
    pub display_name: String,
    /// Visit counter.
    #[serde(rename = "numCoffees")]
    pub visit_count: u64,
}

impl User {
    /// Creates a user with an empty name and zero visits.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            visit_count: 0,
        }
    }

    /// Sets the display name.
    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Sets the visit counter.
    #[must_use]
    pub const fn with_visit_count(mut self, count: u64) -> Self {
        self.visit_count = count;
        self
    }
}
