// src/storage/json_file.rs
//! File-backed storage. Each collection lives in its own JSON document
//! holding an array of `[id, value]` pairs and the next id to hand out.
//!
//! All writes go through one mutex, and each document is replaced via a
//! temp file and a rename, so concurrent creates cannot interleave and a
//! crash never leaves a half-written file behind.

use super::{Storage, StorageResult, Tables};
use crate::models::drawing::{DrawingRecord, NewDrawing};
use crate::models::user::User;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub const USERS_FILE: &str = "users.json";
pub const DRAWINGS_FILE: &str = "drawings.json";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UsersSnapshot<'a> {
    users: Vec<(u64, &'a User)>,
    next_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsersFile {
    users: Vec<(u64, User)>,
    next_id: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DrawingsSnapshot<'a> {
    drawings: Vec<(u64, &'a DrawingRecord)>,
    next_id: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DrawingsFile {
    drawings: Vec<(u64, DrawingRecord)>,
    next_id: u64,
}

#[derive(Debug)]
pub struct JsonFileStorage {
    tables: Mutex<Tables>,
    users_path: PathBuf,
    drawings_path: PathBuf,
}

impl JsonFileStorage {
    /// Open (or create) the store in `data_dir`. Missing files start empty;
    /// unreadable ones are an error rather than being silently replaced.
    pub async fn open(data_dir: &Path) -> StorageResult<Self> {
        tokio::fs::create_dir_all(data_dir).await?;

        let users_path = data_dir.join(USERS_FILE);
        let drawings_path = data_dir.join(DRAWINGS_FILE);
        let mut tables = Tables::default();

        if let Some(file) = read_document::<UsersFile>(&users_path).await? {
            let max_id = file.users.iter().map(|(id, _)| *id).max().unwrap_or(0);
            tables.users = file.users.into_iter().collect();
            tables.next_user_id = file.next_id.max(max_id + 1);
        }

        if let Some(file) = read_document::<DrawingsFile>(&drawings_path).await? {
            let max_id = file.drawings.iter().map(|(id, _)| *id).max().unwrap_or(0);
            tables.drawings = file.drawings.into_iter().collect();
            tables.next_drawing_id = file.next_id.max(max_id + 1);
        }

        tracing::info!(
            data_dir = %data_dir.display(),
            users = tables.users.len(),
            drawings = tables.drawings.len(),
            next_drawing_id = tables.next_drawing_id,
            "JSON file storage opened"
        );

        Ok(Self {
            tables: Mutex::new(tables),
            users_path,
            drawings_path,
        })
    }

    async fn persist_users(&self, tables: &Tables) -> StorageResult<()> {
        let snapshot = UsersSnapshot {
            users: tables.users.iter().map(|(id, user)| (*id, user)).collect(),
            next_id: tables.next_user_id,
        };
        write_document(&self.users_path, &snapshot).await
    }

    async fn persist_drawings(&self, tables: &Tables) -> StorageResult<()> {
        let snapshot = DrawingsSnapshot {
            drawings: tables.drawings.iter().map(|(id, d)| (*id, d)).collect(),
            next_id: tables.next_drawing_id,
        };
        write_document(&self.drawings_path, &snapshot).await
    }
}

async fn read_document<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_document<T: Serialize>(path: &Path, value: &T) -> StorageResult<()> {
    let bytes = serde_json::to_vec_pretty(value)?;
    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, &bytes).await?;
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        match tokio::fs::remove_file(&tmp_path).await {
            Ok(()) => tracing::debug!(path = %tmp_path.display(), "Removed temp file after failed rename"),
            Err(cleanup) => tracing::debug!(
                path = %tmp_path.display(),
                error = %cleanup,
                "Could not remove temp file after failed rename"
            ),
        }
        return Err(e.into());
    }
    Ok(())
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn create_drawing(&self, drawing: NewDrawing) -> StorageResult<DrawingRecord> {
        let mut tables = self.tables.lock().await;
        let record = tables.insert_drawing(drawing);

        if let Err(e) = self.persist_drawings(&tables).await {
            tracing::error!(drawing_id = record.id, error = %e, "Failed to persist drawing");
            tables.rollback_drawing(record.id);
            return Err(e);
        }

        tracing::debug!(drawing_id = record.id, "💾 Drawing persisted");
        Ok(record)
    }

    async fn get_drawing(&self, id: u64) -> StorageResult<Option<DrawingRecord>> {
        Ok(self.tables.lock().await.drawings.get(&id).cloned())
    }

    async fn all_drawings(&self) -> StorageResult<Vec<DrawingRecord>> {
        Ok(self.tables.lock().await.drawings.values().cloned().collect())
    }

    async fn drawing_count(&self) -> StorageResult<usize> {
        Ok(self.tables.lock().await.drawings.len())
    }

    async fn drawings_by_user(&self, user_id: u64) -> StorageResult<Vec<DrawingRecord>> {
        Ok(self.tables.lock().await.drawings_by_user(user_id))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StorageResult<User> {
        let mut tables = self.tables.lock().await;
        let user = tables.insert_user(username, password_hash)?;

        if let Err(e) = self.persist_users(&tables).await {
            tracing::error!(user_id = user.id, error = %e, "Failed to persist user");
            tables.rollback_user(user.id);
            return Err(e);
        }

        Ok(user)
    }

    async fn get_user(&self, id: u64) -> StorageResult<Option<User>> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self.tables.lock().await.user_by_username(username).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::{exercise_backend, text_drawing};
    use crate::storage::StorageError;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_file_backend() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        exercise_backend(&storage).await;

        assert!(dir.path().join(DRAWINGS_FILE).exists());
        assert!(dir.path().join(USERS_FILE).exists());
        assert!(!dir.path().join("drawings.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_ids_keep_increasing_across_reopen() {
        let dir = tempfile::tempdir().unwrap();

        let first = {
            let storage = JsonFileStorage::open(dir.path()).await.unwrap();
            storage.create_drawing(text_drawing("a cat", None)).await.unwrap();
            storage.create_drawing(text_drawing("a dog", None)).await.unwrap()
        };

        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        assert_eq!(storage.get_drawing(first.id).await.unwrap(), Some(first.clone()));

        let next = storage.create_drawing(text_drawing("a house", None)).await.unwrap();
        assert!(next.id > first.id);
    }

    #[tokio::test]
    async fn test_document_layout() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        storage.create_drawing(text_drawing("a cat", None)).await.unwrap();

        let raw = tokio::fs::read_to_string(dir.path().join(DRAWINGS_FILE)).await.unwrap();
        let doc: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(doc["nextId"], 2);
        assert_eq!(doc["drawings"][0][0], 1);
        assert_eq!(doc["drawings"][0][1]["inputType"], "text");
        assert_eq!(doc["drawings"][0][1]["prompt"], "a cat");
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_all_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(JsonFileStorage::open(dir.path()).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..16 {
            let storage = storage.clone();
            handles.push(tokio::spawn(async move {
                storage
                    .create_drawing(text_drawing(&format!("drawing {}", i), None))
                    .await
                    .unwrap()
                    .id
            }));
        }
        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        assert_eq!(ids, (1..=16).collect::<Vec<u64>>());

        let reopened = JsonFileStorage::open(dir.path()).await.unwrap();
        assert_eq!(reopened.all_drawings().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join(DRAWINGS_FILE), "[]").await.unwrap();

        let result = JsonFileStorage::open(dir.path()).await;
        assert!(matches!(result, Err(StorageError::Json(_))));
    }

    #[tokio::test]
    async fn test_next_id_never_reuses_stored_ids() {
        let dir = tempfile::tempdir().unwrap();
        let doc = serde_json::json!({
            "drawings": [[7, {
                "id": 7, "userId": null, "prompt": "x", "inputType": "text",
                "inputImageUrl": null, "outputImageUrl": null, "steps": [],
                "createdAt": "2024-01-01T00:00:00Z"
            }]],
            "nextId": 3
        });
        tokio::fs::write(dir.path().join(DRAWINGS_FILE), doc.to_string()).await.unwrap();

        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        let record = storage.create_drawing(text_drawing("y", None)).await.unwrap();
        assert_eq!(record.id, 8);
    }

    #[tokio::test]
    async fn test_failed_write_rolls_back_insert() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::open(dir.path()).await.unwrap();

        // A directory in place of the document makes the rename fail.
        let blocker = dir.path().join(DRAWINGS_FILE);
        tokio::fs::create_dir(&blocker).await.unwrap();

        let result = storage.create_drawing(text_drawing("a cat", None)).await;
        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(storage.drawing_count().await.unwrap(), 0);
        assert!(storage.get_drawing(1).await.unwrap().is_none());
        assert!(!dir.path().join("drawings.json.tmp").exists());

        tokio::fs::remove_dir(&blocker).await.unwrap();
        let record = storage.create_drawing(text_drawing("a dog", None)).await.unwrap();
        assert_eq!(record.id, 1);
        assert_eq!(storage.drawing_count().await.unwrap(), 1);
    }
}
