//! Flat-file JSON database.
//!
//! The whole document is read and parsed on every operation and fully rewritten on every
//! mutation, so edits made to the file by hand are picked up on the next request.
//!
//! Concurrency policy:
//! - Mutations are serialized through a single async writer lock held across the
//!   read-modify-write cycle, so concurrent updates never clobber one another.
//! - Writes go to a uniquely named temporary file next to the database and are renamed over
//!   it. Readers never take the lock and always observe either the old or the new document.
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::db::models::Database;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0}")]
    NotFound(String),
    #[error("Database file I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct JsonStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonStore {
    /// Opens the store, creating an empty database file (and its directory) when none exists.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        };

        if tokio::fs::try_exists(&store.path).await? {
            // Fail fast on a corrupt file instead of on the first request.
            store.read().await?;
            info!(path = ?store.path, "Opened JSON database.");
        } else {
            let _guard = store.write_lock.lock().await;
            store.write_document(&Database::default()).await?;
            info!(path = ?store.path, "Created empty JSON database.");
        }

        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads and parses the full document. A missing or empty file is an empty database.
    pub async fn read(&self) -> Result<Database, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Database::default()),
            Err(e) => {
                error!(path = ?self.path, error = %e, "Failed to read JSON database.");
                return Err(e.into());
            }
        };

        if raw.trim().is_empty() {
            return Ok(Database::default());
        }

        serde_json::from_str(&raw).map_err(|e| {
            error!(path = ?self.path, error = %e, "Failed to parse JSON database.");
            StoreError::Json(e)
        })
    }

    /// Runs `operation` against a freshly read document and persists the result.
    /// Nothing is written when `operation` fails.
    pub async fn update<T, F>(&self, operation: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Database) -> Result<T, StoreError>,
    {
        let _guard = self.write_lock.lock().await;

        let mut db = self.read().await?;
        let result = operation(&mut db)?;
        self.write_document(&db).await?;

        Ok(result)
    }

    // Caller must hold `write_lock`.
    async fn write_document(&self, db: &Database) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let payload = serde_json::to_vec_pretty(db)?;
        let temp_path = self.temp_path();

        if let Err(e) = tokio::fs::write(&temp_path, payload).await {
            error!(path = ?temp_path, error = %e, "Failed to write JSON database.");
            return Err(e.into());
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            error!(path = ?self.path, error = %e, "Failed to replace JSON database.");
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        debug!(path = ?self.path, "JSON database written.");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "db.json".to_string());
        self.path
            .with_file_name(format!("{file_name}.{}.tmp", Uuid::new_v4().simple()))
    }
}
