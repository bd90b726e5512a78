use crate::domain::model::{Field, FieldValue, StudentRecord};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn database_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn seed_file(&self) -> Option<&str>;
    fn max_score(&self) -> f64;
}

/// Persistent table of student rows, keyed by identifier.
///
/// Implementations serialize their own writes; concurrent updates of one
/// row resolve as last-writer-wins.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fails with `DuplicateKey` when the identifier is taken.
    async fn create(&self, record: &StudentRecord) -> Result<()>;

    /// Insert-or-ignore. Returns `false` when the identifier already existed.
    async fn create_if_absent(&self, record: &StudentRecord) -> Result<bool>;

    async fn read(&self, id: &str) -> Result<StudentRecord>;

    async fn contains(&self, id: &str) -> Result<bool>;

    /// Overwrites one field and returns the row as stored afterwards.
    async fn update(&self, id: &str, field: Field, value: FieldValue) -> Result<StudentRecord>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Every row in insertion order.
    async fn list_all(&self) -> Result<Vec<StudentRecord>>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    type Extracted: Send;
    type Transformed: Send;
    type Output: Send;

    fn name(&self) -> &str {
        "pipeline"
    }

    async fn extract(&self) -> Result<Self::Extracted>;
    async fn transform(&self, data: Self::Extracted) -> Result<Self::Transformed>;
    async fn load(&self, result: Self::Transformed) -> Result<Self::Output>;
}
