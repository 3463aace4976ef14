use super::{Storage, StorageResult, Tables};
use crate::models::drawing::{DrawingRecord, NewDrawing};
use crate::models::user::User;
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Process-local storage. Nothing is written to disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    tables: RwLock<Tables>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_drawing(&self, drawing: NewDrawing) -> StorageResult<DrawingRecord> {
        let mut tables = self.tables.write().await;
        Ok(tables.insert_drawing(drawing))
    }

    async fn get_drawing(&self, id: u64) -> StorageResult<Option<DrawingRecord>> {
        Ok(self.tables.read().await.drawings.get(&id).cloned())
    }

    async fn all_drawings(&self) -> StorageResult<Vec<DrawingRecord>> {
        Ok(self.tables.read().await.drawings.values().cloned().collect())
    }

    async fn drawing_count(&self) -> StorageResult<usize> {
        Ok(self.tables.read().await.drawings.len())
    }

    async fn drawings_by_user(&self, user_id: u64) -> StorageResult<Vec<DrawingRecord>> {
        Ok(self.tables.read().await.drawings_by_user(user_id))
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> StorageResult<User> {
        self.tables.write().await.insert_user(username, password_hash)
    }

    async fn get_user(&self, id: u64) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self.tables.read().await.user_by_username(username).cloned())
    }
}
