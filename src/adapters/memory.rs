use crate::domain::model::{Field, FieldValue, StudentRecord};
use crate::domain::ports::RecordStore;
use crate::utils::error::{GradebookError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Non-persistent store with the same semantics as the SQLite one.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    rows: Arc<Mutex<Vec<StudentRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<StudentRecord>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(records)),
        }
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(&self, record: &StudentRecord) -> Result<()> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|r| r.id == record.id) {
            return Err(GradebookError::DuplicateKey {
                id: record.id.clone(),
            });
        }
        rows.push(record.clone());
        Ok(())
    }

    async fn create_if_absent(&self, record: &StudentRecord) -> Result<bool> {
        let mut rows = self.rows.lock().await;
        if rows.iter().any(|r| r.id == record.id) {
            return Ok(false);
        }
        rows.push(record.clone());
        Ok(true)
    }

    async fn read(&self, id: &str) -> Result<StudentRecord> {
        let rows = self.rows.lock().await;
        rows.iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| GradebookError::not_found(id))
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        Ok(self.rows.lock().await.iter().any(|r| r.id == id))
    }

    async fn update(&self, id: &str, field: Field, value: FieldValue) -> Result<StudentRecord> {
        let mut rows = self.rows.lock().await;
        let row = rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| GradebookError::not_found(id))?;

        // Apply to a copy so a type mismatch leaves the row untouched.
        let mut updated = row.clone();
        updated.apply(field, value)?;
        *row = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut rows = self.rows.lock().await;
        let position = rows
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| GradebookError::not_found(id))?;
        rows.remove(position);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>> {
        Ok(self.rows.lock().await.clone())
    }
}
