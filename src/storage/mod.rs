// src/storage/mod.rs
//! Repository interface for users and drawing records, with an in-memory
//! backend and a JSON-file backend. Handlers only see `dyn Storage`.

use crate::config::{Config, StorageBackend};
use crate::models::drawing::{DrawingRecord, NewDrawing};
use crate::models::user::User;
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Conflict(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Assign the next id, stamp the creation time and store the record.
    /// Returns only after the record is durable for the backend in use.
    async fn create_drawing(&self, drawing: NewDrawing) -> StorageResult<DrawingRecord>;
    async fn get_drawing(&self, id: u64) -> StorageResult<Option<DrawingRecord>>;
    async fn all_drawings(&self) -> StorageResult<Vec<DrawingRecord>>;
    async fn drawing_count(&self) -> StorageResult<usize>;
    async fn drawings_by_user(&self, user_id: u64) -> StorageResult<Vec<DrawingRecord>>;

    async fn create_user(&self, username: &str, password_hash: &str) -> StorageResult<User>;
    async fn get_user(&self, id: u64) -> StorageResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
}

pub type SharedStorage = Arc<dyn Storage>;

/// Build the backend selected in the configuration.
pub async fn open(config: &Config) -> StorageResult<SharedStorage> {
    match config.storage_backend {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage, drawings will not survive a restart");
            Ok(Arc::new(MemoryStorage::new()))
        }
        StorageBackend::File => {
            let storage = JsonFileStorage::open(&config.data_dir).await?;
            Ok(Arc::new(storage))
        }
    }
}

/// In-memory tables shared by both backends. Ids start at 1.
#[derive(Debug)]
pub(crate) struct Tables {
    pub users: BTreeMap<u64, User>,
    pub drawings: BTreeMap<u64, DrawingRecord>,
    pub next_user_id: u64,
    pub next_drawing_id: u64,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            drawings: BTreeMap::new(),
            next_user_id: 1,
            next_drawing_id: 1,
        }
    }
}

impl Tables {
    pub fn insert_drawing(&mut self, drawing: NewDrawing) -> DrawingRecord {
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        let record = drawing.into_record(id, Utc::now());
        self.drawings.insert(id, record.clone());
        record
    }

    /// Undo the most recent `insert_drawing` after a failed write.
    pub fn rollback_drawing(&mut self, id: u64) {
        self.drawings.remove(&id);
        self.next_drawing_id = id;
    }

    pub fn insert_user(&mut self, username: &str, password_hash: &str) -> StorageResult<User> {
        if self.user_by_username(username).is_some() {
            return Err(StorageError::Conflict(format!(
                "Username '{}' is already taken",
                username
            )));
        }
        let id = self.next_user_id;
        self.next_user_id += 1;
        let user = User {
            id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
        };
        self.users.insert(id, user.clone());
        Ok(user)
    }

    pub fn rollback_user(&mut self, id: u64) {
        self.users.remove(&id);
        self.next_user_id = id;
    }

    pub fn user_by_username(&self, username: &str) -> Option<&User> {
        self.users.values().find(|user| user.username == username)
    }

    pub fn drawings_by_user(&self, user_id: u64) -> Vec<DrawingRecord> {
        self.drawings
            .values()
            .filter(|drawing| drawing.user_id == Some(user_id))
            .cloned()
            .collect()
    }
}
