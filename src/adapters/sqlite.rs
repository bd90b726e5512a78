//! SQLite-backed record store.

use crate::adapters::db;
use crate::domain::model::{Field, FieldValue, StudentRecord, Subject, ENROLL_DATE_FORMAT};
use crate::domain::ports::RecordStore;
use crate::utils::error::{GradebookError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::types::{Type, Value};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

const SELECT_COLUMNS: &str =
    "SELECT ID, Name, Gender, Enroll_Date, English, Math, History, Science, Arts FROM student";

/// One connection behind one lock, so every call is its own transaction and
/// writers never interleave.
#[derive(Clone)]
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteRecordStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        tracing::debug!("Opening student database at {}", path.as_ref().display());
        let conn = db::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(db::open_in_memory()?)
    }

    pub fn from_connection(conn: Connection) -> Result<Self> {
        db::configure(&conn)?;
        db::ensure_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<StudentRecord> {
    let enroll_date = match row.get::<_, Option<String>>(3)? {
        Some(text) if !text.is_empty() => Some(
            NaiveDate::parse_from_str(&text, ENROLL_DATE_FORMAT)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?,
        ),
        _ => None,
    };

    let mut scores = BTreeMap::new();
    for (offset, subject) in Subject::ALL.into_iter().enumerate() {
        if let Some(score) = row.get::<_, Option<f64>>(4 + offset)? {
            scores.insert(subject, score);
        }
    }

    Ok(StudentRecord {
        id: row.get(0)?,
        name: row.get(1)?,
        gender: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
        enroll_date,
        scores,
    })
}

fn sql_value(value: &FieldValue) -> Value {
    match value {
        FieldValue::Text(text) => Value::Text(text.clone()),
        FieldValue::Date(Some(date)) => Value::Text(date.format(ENROLL_DATE_FORMAT).to_string()),
        FieldValue::Score(Some(score)) => Value::Real(*score),
        FieldValue::Date(None) | FieldValue::Score(None) => Value::Null,
    }
}

fn insert(conn: &Connection, verb: &str, record: &StudentRecord) -> rusqlite::Result<usize> {
    let sql = format!(
        "{} INTO student (ID, Name, Gender, Enroll_Date, English, Math, History, Science, Arts)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        verb
    );
    conn.execute(
        &sql,
        params![
            record.id,
            record.name,
            record.gender,
            record
                .enroll_date
                .map(|d| d.format(ENROLL_DATE_FORMAT).to_string()),
            record.score(Subject::English),
            record.score(Subject::Math),
            record.score(Subject::History),
            record.score(Subject::Science),
            record.score(Subject::Arts),
        ],
    )
}

fn select_one(conn: &Connection, id: &str) -> rusqlite::Result<Option<StudentRecord>> {
    conn.query_row(
        &format!("{} WHERE ID = ?1", SELECT_COLUMNS),
        [id],
        row_to_record,
    )
    .optional()
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn create(&self, record: &StudentRecord) -> Result<()> {
        let conn = self.conn.lock().await;
        match insert(&conn, "INSERT", record) {
            Ok(_) => {
                tracing::debug!("Inserted student {}", record.id);
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(GradebookError::DuplicateKey {
                    id: record.id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn create_if_absent(&self, record: &StudentRecord) -> Result<bool> {
        let conn = self.conn.lock().await;
        let changed = insert(&conn, "INSERT OR IGNORE", record)?;
        Ok(changed > 0)
    }

    async fn read(&self, id: &str) -> Result<StudentRecord> {
        let conn = self.conn.lock().await;
        select_one(&conn, id)?.ok_or_else(|| GradebookError::not_found(id))
    }

    async fn contains(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let found = conn
            .query_row("SELECT 1 FROM student WHERE ID = ?1", [id], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    async fn update(&self, id: &str, field: Field, value: FieldValue) -> Result<StudentRecord> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;

        let mut record = select_one(&tx, id)?.ok_or_else(|| GradebookError::not_found(id))?;
        let stored = sql_value(&value);
        record.apply(field, value)?;

        // Column names come from the closed `Field` enum, never from input.
        let sql = format!("UPDATE student SET {} = ?1 WHERE ID = ?2", field.column());
        tx.execute(&sql, params![stored, id])?;
        tx.commit()?;

        tracing::debug!("Updated {} for student {}", field, id);
        Ok(record)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM student WHERE ID = ?1", [id])?;
        if removed == 0 {
            return Err(GradebookError::not_found(id));
        }
        tracing::debug!("Deleted student {}", id);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(&format!("{} ORDER BY rowid", SELECT_COLUMNS))?;
        let records = stmt
            .query_map([], row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        tracing::debug!("Listed {} students", records.len());
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walt() -> StudentRecord {
        StudentRecord::new("53821", "Walt")
            .with_gender("Male")
            .with_enroll_date(NaiveDate::from_ymd_opt(2022, 9, 1).unwrap())
            .with_score(Subject::English, 78.0)
            .with_score(Subject::Math, 93.0)
            .with_score(Subject::History, 86.0)
            .with_score(Subject::Science, 95.0)
            .with_score(Subject::Arts, 88.0)
    }

    #[tokio::test]
    async fn test_create_then_read_round_trips() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store.create(&walt()).await.unwrap();

        assert_eq!(store.read("53821").await.unwrap(), walt());
        assert!(store.contains("53821").await.unwrap());
    }

    #[tokio::test]
    async fn test_missing_scores_stay_absent() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        let record = StudentRecord::new("1", "Ann").with_score(Subject::Math, 70.0);
        store.create(&record).await.unwrap();

        let stored = store.read("1").await.unwrap();
        assert_eq!(stored.score(Subject::Math), Some(70.0));
        assert_eq!(stored.score(Subject::Arts), None);
        assert_eq!(stored.enroll_date, None);
    }

    #[tokio::test]
    async fn test_duplicate_create_fails() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store.create(&walt()).await.unwrap();

        let err = store.create(&walt()).await.unwrap_err();
        assert!(matches!(err, GradebookError::DuplicateKey { ref id } if id == "53821"));
    }

    #[tokio::test]
    async fn test_create_if_absent_ignores_existing_rows() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        assert!(store.create_if_absent(&walt()).await.unwrap());

        let renamed = StudentRecord::new("53821", "Someone Else");
        assert!(!store.create_if_absent(&renamed).await.unwrap());
        assert_eq!(store.read("53821").await.unwrap().name, "Walt");
    }

    #[tokio::test]
    async fn test_update_changes_one_column() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store.create(&walt()).await.unwrap();

        let updated = store
            .update(
                "53821",
                Field::Score(Subject::English),
                FieldValue::Score(Some(85.0)),
            )
            .await
            .unwrap();
        assert_eq!(updated.score(Subject::English), Some(85.0));

        let stored = store.read("53821").await.unwrap();
        let mut expected = walt();
        expected.scores.insert(Subject::English, 85.0);
        assert_eq!(stored, expected);
    }

    #[tokio::test]
    async fn test_update_rejects_mismatched_type_without_writing() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store.create(&walt()).await.unwrap();

        let result = store
            .update("53821", Field::Name, FieldValue::Score(Some(1.0)))
            .await;
        assert!(matches!(result, Err(GradebookError::InvalidValue { .. })));
        assert_eq!(store.read("53821").await.unwrap(), walt());
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let store = SqliteRecordStore::open_in_memory().unwrap();

        assert!(matches!(
            store.read("99999").await,
            Err(GradebookError::NotFound { .. })
        ));
        assert!(matches!(
            store
                .update("99999", Field::Name, FieldValue::Text("X".into()))
                .await,
            Err(GradebookError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete("99999").await,
            Err(GradebookError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_then_read_fails() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        store.create(&walt()).await.unwrap();
        store.delete("53821").await.unwrap();

        assert!(matches!(
            store.read("53821").await,
            Err(GradebookError::NotFound { .. })
        ));
        assert!(!store.contains("53821").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_all_keeps_insertion_order() {
        let store = SqliteRecordStore::open_in_memory().unwrap();
        for id in ["30", "10", "20"] {
            store.create(&StudentRecord::new(id, "S")).await.unwrap();
        }

        let ids: Vec<String> = store
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["30", "10", "20"]);
    }

    #[tokio::test]
    async fn test_file_database_persists_between_opens() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("student.db");

        {
            let store = SqliteRecordStore::open(&path).unwrap();
            store.create(&walt()).await.unwrap();
        }

        let store = SqliteRecordStore::open(&path).unwrap();
        assert_eq!(store.read("53821").await.unwrap(), walt());
    }
}
