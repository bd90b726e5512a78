use crate::domain::model::{Attribute, FieldValue, StudentRecord};
use crate::domain::ports::RecordStore;
use crate::utils::error::{GradebookError, Result};

/// Cached copy of the last `list_all()`; lookups never touch the store.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<StudentRecord>,
}

impl Catalog {
    pub async fn load<R: RecordStore + ?Sized>(store: &R) -> Result<Self> {
        let records = store.list_all().await?;
        tracing::debug!("Catalog loaded with {} students", records.len());
        Ok(Self { records })
    }

    pub async fn refresh<R: RecordStore + ?Sized>(&mut self, store: &R) -> Result<()> {
        self.records = store.list_all().await?;
        Ok(())
    }

    pub fn get(&self, id: &str) -> Result<&StudentRecord> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| GradebookError::not_found(id))
    }

    pub fn attribute(&self, id: &str, attribute: Attribute) -> Result<FieldValue> {
        self.get(id).map(|record| record.attribute(attribute))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.id.as_str())
    }

    pub fn records(&self) -> &[StudentRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
