//! Filesystem-backed user store.
//!
//! Keeps the whole user list in one `.usrl` document, the same format the
//! export service writes, at `<data_dir>/users.usrl`.

use crate::io::formats::json;
use crate::io::schema::USER_SCHEMA;
use crate::io::services::export::write_atomic;
use crate::models::User;
use crate::storage::memory::MemoryStore;
use crate::storage::traits::{UpsertSummary, UserStore};
use crate::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the store document inside the data directory.
pub const STORE_FILE_NAME: &str = "users.usrl";

/// User store persisted as a single structured document.
///
/// The document is loaded once on open. Every write encodes a new document
/// and renames it into place, so the file on disk is always complete.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: MemoryStore,
}

impl FileStore {
    /// Opens the store in `data_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or an existing
    /// document cannot be decoded.
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir).map_err(|e| Error::io("create_data_dir", data_dir, &e))?;

        let path = data_dir.join(STORE_FILE_NAME);
        let cache = if path.exists() {
            let bytes = fs::read(&path).map_err(|e| Error::io("read_store", &path, &e))?;
            let users: Vec<User> = json::decode_structured(&USER_SCHEMA, &bytes)?;
            MemoryStore::with_users(&users)?
        } else {
            MemoryStore::new()
        };

        tracing::debug!(path = %path.display(), users = cache.count()?, "Opened user store");
        Ok(Self { path, cache })
    }

    /// Path of the store document.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, next: &MemoryStore) -> Result<()> {
        let bytes = json::encode_structured(&USER_SCHEMA, &next.all_users()?)?;
        write_atomic(&self.path, &bytes)
    }
}

impl UserStore for FileStore {
    fn all_users(&self) -> Result<Vec<User>> {
        self.cache.all_users()
    }

    fn upsert_users(&mut self, users: &[User]) -> Result<UpsertSummary> {
        let mut next = self.cache.clone();
        let summary = next.upsert_users(users)?;
        self.persist(&next)?;
        self.cache = next;
        Ok(summary)
    }

    fn delete_user(&mut self, id: &str) -> Result<bool> {
        let mut next = self.cache.clone();
        if !next.delete_user(id)? {
            return Ok(false);
        }
        self.persist(&next)?;
        self.cache = next;
        Ok(true)
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        self.cache.get_user(id)
    }

    fn count(&self) -> Result<usize> {
        self.cache.count()
    }
}
