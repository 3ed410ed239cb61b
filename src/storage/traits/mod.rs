//! Storage backend traits.

mod user_store;

pub use user_store::{UpsertSummary, UserStore};
