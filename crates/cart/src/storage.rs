//! Durable storage backends for the cart slot.
//!
//! The persisted representation is the full serialized line list; every save
//! overwrites the slot wholesale. There is no versioning or migration: a
//! shape change in [`crate::CartLine`] invalidates old payloads, which the
//! store then discards on hydration.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::error::StorageError;

/// Name of the durable slot holding the serialized cart.
pub const CART_SLOT: &str = "cart";

/// A durable slot the serialized cart payload is read from and written to.
///
/// Reads and writes are modeled as suspension points even where a backend is
/// effectively synchronous. Concurrent writers (e.g., two tabs over the same
/// file) are last-write-wins; the trait imposes no locking.
#[allow(async_fn_in_trait)]
pub trait CartStorage {
    /// Read the current payload, or `None` if the slot has never been written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the slot exists but cannot be read.
    async fn load(&self) -> Result<Option<String>, StorageError>;

    /// Overwrite the slot with a new payload.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] if the slot cannot be written.
    async fn save(&self, payload: &str) -> Result<(), StorageError>;
}

/// File-backed cart storage.
///
/// Stores the payload as `<data_dir>/cart.json`, creating the directory on
/// first save.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Create a file store rooted at the given data directory.
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            path: data_dir.as_ref().join(format!("{CART_SLOT}.json")),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartStorage for FileStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(payload) => Ok(Some(payload)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, payload: &str) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, payload).await?;
        Ok(())
    }
}

/// In-memory cart storage for tests and ephemeral carts.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    /// Create an empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory store pre-seeded with a payload.
    #[must_use]
    pub fn with_payload(payload: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(payload.into())),
        }
    }

    /// Current raw payload, if any.
    #[must_use]
    pub fn payload(&self) -> Option<String> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CartStorage for MemoryStore {
    async fn load(&self) -> Result<Option<String>, StorageError> {
        Ok(self.payload())
    }

    async fn save(&self, payload: &str) -> Result<(), StorageError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(payload.to_string());
        Ok(())
    }
}
