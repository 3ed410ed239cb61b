//! Data models for usershare.

mod snapshot;
mod user;

pub use snapshot::Snapshot;
pub use user::User;
