use crate::adapters::LocalStorage;
use crate::domain::model::{Field, ImportReport, StudentRecord, Subject, TSV_COLUMNS};
use crate::domain::ports::{ConfigProvider, Pipeline, RecordStore, Storage};
use crate::core::etl::EtlEngine;
use crate::utils::error::{GradebookError, Result};
use crate::utils::validation::{validate_cell_text, validate_non_empty_string};
use std::collections::HashMap;

/// One data line of the TSV, keyed by header name. `cells` is an error when
/// the line could not be decoded.
#[derive(Debug)]
pub struct RawRow {
    pub line: u64,
    pub cells: Result<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    pub records: Vec<StudentRecord>,
    pub rejected: usize,
}

fn cell<'a>(cells: &'a HashMap<String, String>, column: &str) -> &'a str {
    cells.get(column).map(String::as_str).unwrap_or("")
}

/// Builds a record from header-keyed text cells. Missing cells count as empty.
pub fn parse_row(cells: &HashMap<String, String>, max_score: f64) -> Result<StudentRecord> {
    let id = cell(cells, "ID").trim();
    validate_non_empty_string("ID", id)?;
    validate_cell_text("ID", id)?;

    let mut record = StudentRecord::new(id, "");
    let mut fields = vec![Field::Name, Field::Gender, Field::EnrollDate];
    fields.extend(Subject::ALL.into_iter().map(Field::Score));

    for field in fields {
        let value = field.parse_value(cell(cells, field.column()), max_score)?;
        record.apply(field, value)?;
    }

    Ok(record)
}

/// Reads a tab-separated student file and inserts new rows (insert-or-ignore).
pub struct TsvImportPipeline<S: Storage, R: RecordStore> {
    storage: S,
    store: R,
    source: String,
    max_score: f64,
}

impl<S: Storage, R: RecordStore> TsvImportPipeline<S, R> {
    pub fn new(storage: S, store: R, source: impl Into<String>, max_score: f64) -> Self {
        Self {
            storage,
            store,
            source: source.into(),
            max_score,
        }
    }
}

fn read_rows(data: &[u8]) -> Result<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let missing: Vec<&str> = ["ID", "Name"]
        .into_iter()
        .filter(|required| !headers.iter().any(|h| h.as_str() == *required))
        .collect();
    if !missing.is_empty() {
        return Err(GradebookError::invalid_value(
            "header",
            headers.join("\t"),
            format!("Missing required columns: {}", missing.join(", ")),
        ));
    }

    for header in &headers {
        if !TSV_COLUMNS.contains(&header.as_str()) {
            tracing::warn!("Ignoring unknown column '{}'", header);
        }
    }

    let mut rows = Vec::new();
    for result in reader.byte_records() {
        let record = result?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line()).unwrap_or_default();
        let cells = decode_cells(&headers, &record, line);
        rows.push(RawRow { line, cells });
    }
    Ok(rows)
}

fn decode_cells(
    headers: &[String],
    record: &csv::ByteRecord,
    line: u64,
) -> Result<HashMap<String, String>> {
    headers
        .iter()
        .zip(record.iter())
        .map(|(header, cell)| {
            std::str::from_utf8(cell)
                .map(|text| (header.clone(), text.to_string()))
                .map_err(|e| {
                    GradebookError::invalid_value(
                        header.as_str(),
                        String::from_utf8_lossy(cell),
                        format!("Line {} is not valid UTF-8: {}", line, e),
                    )
                })
        })
        .collect()
}

#[async_trait::async_trait]
impl<S: Storage, R: RecordStore> Pipeline for TsvImportPipeline<S, R> {
    type Extracted = Vec<RawRow>;
    type Transformed = ImportBatch;
    type Output = ImportReport;

    fn name(&self) -> &str {
        "TSV import"
    }

    async fn extract(&self) -> Result<Vec<RawRow>> {
        tracing::debug!("Reading student file {}", self.source);
        let data = self.storage.read_file(&self.source).await?;
        read_rows(&data)
    }

    async fn transform(&self, data: Vec<RawRow>) -> Result<ImportBatch> {
        let mut batch = ImportBatch::default();
        for row in data {
            match row.cells.and_then(|cells| parse_row(&cells, self.max_score)) {
                Ok(record) => batch.records.push(record),
                Err(e) => {
                    tracing::warn!("Skipping line {} of {}: {}", row.line, self.source, e);
                    batch.rejected += 1;
                }
            }
        }
        Ok(batch)
    }

    async fn load(&self, batch: ImportBatch) -> Result<ImportReport> {
        let mut report = ImportReport {
            rejected: batch.rejected,
            ..ImportReport::default()
        };
        for record in &batch.records {
            if self.store.create_if_absent(record).await? {
                report.inserted += 1;
            } else {
                tracing::debug!("Student {} already stored, skipping", record.id);
                report.skipped += 1;
            }
        }
        Ok(report)
    }
}

/// Imports the configured seed file, if any. Runs on every start; rows that
/// already exist are left alone.
pub async fn seed_store<C, R>(config: &C, store: R) -> Result<Option<ImportReport>>
where
    C: ConfigProvider,
    R: RecordStore,
{
    let Some(seed_file) = config.seed_file() else {
        return Ok(None);
    };

    let pipeline = TsvImportPipeline::new(
        LocalStorage::new("."),
        store,
        seed_file,
        config.max_score(),
    );
    let report = EtlEngine::new(pipeline).run().await?;
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryRecordStore;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        async fn with_file(path: &str, content: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .await
                .insert(path.to_string(), content.as_bytes().to_vec());
            storage
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                GradebookError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<String> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(path.to_string())
        }
    }

    const SAMPLE: &str = "ID\tName\tGender\tEnroll_Date\tEnglish\tMath\tHistory\tScience\tArts
53821\tWalt\tMale\t9-1-2022\t78\t93\t86\t95\t88
60112\tRosa\tFemale\t1-15-2021\t91\t77\t\t84\t90
";

    #[tokio::test]
    async fn test_extract_reads_header_keyed_rows() {
        let storage = MockStorage::with_file("student.tsv", SAMPLE).await;
        let pipeline =
            TsvImportPipeline::new(storage, InMemoryRecordStore::new(), "student.tsv", 100.0);

        let rows = pipeline.extract().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells.as_ref().unwrap().get("Name").unwrap(), "Walt");
        assert_eq!(rows[1].cells.as_ref().unwrap().get("History").unwrap(), "");
    }

    #[tokio::test]
    async fn test_extract_requires_id_and_name_columns() {
        let storage = MockStorage::with_file("bad.tsv", "Name\tMath\nWalt\t93\n").await;
        let pipeline = TsvImportPipeline::new(storage, InMemoryRecordStore::new(), "bad.tsv", 100.0);

        let err = pipeline.extract().await.unwrap_err();
        assert!(matches!(err, GradebookError::InvalidValue { ref field, .. } if field == "header"));
    }

    #[tokio::test]
    async fn test_transform_rejects_bad_rows() {
        let content = format!(
            "{}9999\tInvalid\tMale\t99-99-9999\tInvalidGrade\t95\t88\t92\t90\n",
            SAMPLE
        );
        let storage = MockStorage::with_file("student.tsv", &content).await;
        let pipeline =
            TsvImportPipeline::new(storage, InMemoryRecordStore::new(), "student.tsv", 100.0);

        let rows = pipeline.extract().await.unwrap();
        let batch = pipeline.transform(rows).await.unwrap();

        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.rejected, 1);
        assert_eq!(batch.records[1].score(Subject::History), None);
    }

    #[tokio::test]
    async fn test_full_import_is_insert_or_ignore() {
        let storage = MockStorage::with_file("student.tsv", SAMPLE).await;
        let store = InMemoryRecordStore::new();

        let first = EtlEngine::new(TsvImportPipeline::new(
            storage.clone(),
            store.clone(),
            "student.tsv",
            100.0,
        ))
        .run()
        .await
        .unwrap();
        assert_eq!(first.inserted, 2);

        let second = EtlEngine::new(TsvImportPipeline::new(storage, store.clone(), "student.tsv", 100.0))
            .run()
            .await
            .unwrap();
        assert_eq!(second.inserted, 0);
        assert_eq!(second.skipped, 2);
        assert_eq!(store.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_undecodable_row_is_rejected_not_fatal() {
        let mut content = b"ID\tName\tMath\n1\tAnn\t70\n2\t".to_vec();
        content.extend_from_slice(&[0xff, 0xfe]);
        content.extend_from_slice(b"\t80\n3\tBob\t90\n");

        let storage = MockStorage::default();
        storage.write_file("student.tsv", &content).await.unwrap();
        let store = InMemoryRecordStore::new();

        let report = EtlEngine::new(TsvImportPipeline::new(
            storage,
            store.clone(),
            "student.tsv",
            100.0,
        ))
        .run()
        .await
        .unwrap();

        assert_eq!(report.inserted, 2);
        assert_eq!(report.rejected, 1);
        assert!(store.contains("1").await.unwrap());
        assert!(!store.contains("2").await.unwrap());
        assert!(store.contains("3").await.unwrap());
    }

    #[test]
    fn test_parse_row_rejects_line_breaks_in_text() {
        let mut cells = HashMap::new();
        cells.insert("ID".to_string(), "1".to_string());
        cells.insert("Name".to_string(), "Ann\rLee".to_string());
        assert!(matches!(
            parse_row(&cells, 100.0),
            Err(GradebookError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_parse_row_requires_id() {
        let mut cells = HashMap::new();
        cells.insert("Name".to_string(), "Walt".to_string());
        assert!(parse_row(&cells, 100.0).is_err());

        cells.insert("ID".to_string(), "1".to_string());
        let record = parse_row(&cells, 100.0).unwrap();
        assert_eq!(record.name, "Walt");
        assert!(record.scores.is_empty());
    }
}
