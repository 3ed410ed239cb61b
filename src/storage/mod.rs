//! Storage layer abstraction.
//!
//! The import and export services only see the [`UserStore`] trait:
//! - **Memory**: `BTreeMap`-backed, for tests and embedding
//! - **Filesystem**: one `.usrl` document in the data directory

pub mod filesystem;
pub mod memory;
pub mod traits;

pub use filesystem::{FileStore, STORE_FILE_NAME};
pub use memory::MemoryStore;
pub use traits::{UpsertSummary, UserStore};
