use crate::core::statistics::aggregate_records;
use crate::domain::model::{
    format_enroll_date, format_score, Aggregate, StudentRecord, Subject, TSV_COLUMNS,
};
use crate::domain::ports::{Pipeline, RecordStore, Storage};
use crate::utils::error::Result;
use crate::utils::validation::validate_cell_text;
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub const DEFAULT_EXPORT_FILENAME: &str = "new_student.tsv";
pub const DEFAULT_ARCHIVE_FILENAME: &str = "student_report.zip";

/// Renders records as TSV with the standard header. Absent values are empty cells.
/// Fails with InvalidValue on text holding a tab or line break.
pub fn render_tsv(records: &[StudentRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(Vec::new());

    writer.write_record(TSV_COLUMNS)?;
    for record in records {
        validate_cell_text("ID", &record.id)?;
        validate_cell_text("Name", &record.name)?;
        validate_cell_text("Gender", &record.gender)?;

        let mut row = vec![
            record.id.clone(),
            record.name.clone(),
            record.gender.clone(),
            format_enroll_date(record.enroll_date),
        ];
        row.extend(
            Subject::ALL
                .into_iter()
                .map(|subject| format_score(record.score(subject))),
        );
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

/// Per-subject aggregates, leaving out subjects nobody has a score for.
pub fn subject_statistics(records: &[StudentRecord]) -> Vec<Aggregate> {
    Subject::ALL
        .into_iter()
        .filter_map(|subject| aggregate_records(records, subject).ok())
        .collect()
}

/// Writes the whole table back out as a TSV file.
pub struct TsvExportPipeline<S: Storage, R: RecordStore> {
    storage: S,
    store: R,
    filename: String,
}

impl<S: Storage, R: RecordStore> TsvExportPipeline<S, R> {
    pub fn new(storage: S, store: R, filename: impl Into<String>) -> Self {
        Self {
            storage,
            store,
            filename: filename.into(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, R: RecordStore> Pipeline for TsvExportPipeline<S, R> {
    type Extracted = Vec<StudentRecord>;
    type Transformed = Vec<u8>;
    type Output = String;

    fn name(&self) -> &str {
        "TSV export"
    }

    async fn extract(&self) -> Result<Vec<StudentRecord>> {
        self.store.list_all().await
    }

    async fn transform(&self, data: Vec<StudentRecord>) -> Result<Vec<u8>> {
        tracing::debug!("Rendering {} students as TSV", data.len());
        render_tsv(&data)
    }

    async fn load(&self, result: Vec<u8>) -> Result<String> {
        let path = self.storage.write_file(&self.filename, &result).await?;
        tracing::info!("Data exported successfully to: {}", path);
        Ok(path)
    }
}

#[derive(Debug, Clone)]
pub struct ArchiveContents {
    pub tsv: Vec<u8>,
    pub statistics: Vec<Aggregate>,
}

/// Bundles the TSV export with `statistics.json` in a ZIP file.
pub struct ArchiveExportPipeline<S: Storage, R: RecordStore> {
    storage: S,
    store: R,
    filename: String,
}

impl<S: Storage, R: RecordStore> ArchiveExportPipeline<S, R> {
    pub fn new(storage: S, store: R, filename: impl Into<String>) -> Self {
        Self {
            storage,
            store,
            filename: filename.into(),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, R: RecordStore> Pipeline for ArchiveExportPipeline<S, R> {
    type Extracted = Vec<StudentRecord>;
    type Transformed = ArchiveContents;
    type Output = String;

    fn name(&self) -> &str {
        "archive export"
    }

    async fn extract(&self) -> Result<Vec<StudentRecord>> {
        self.store.list_all().await
    }

    async fn transform(&self, data: Vec<StudentRecord>) -> Result<ArchiveContents> {
        Ok(ArchiveContents {
            tsv: render_tsv(&data)?,
            statistics: subject_statistics(&data),
        })
    }

    async fn load(&self, result: ArchiveContents) -> Result<String> {
        let zip_data = {
            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

            zip.start_file::<_, ()>("students.tsv", FileOptions::default())?;
            zip.write_all(&result.tsv)?;

            zip.start_file::<_, ()>("statistics.json", FileOptions::default())?;
            let json_data = serde_json::to_string_pretty(&result.statistics)?;
            zip.write_all(json_data.as_bytes())?;

            let cursor = zip.finish()?;
            cursor.into_inner()
        };

        tracing::debug!("Writing archive ({} bytes) to storage", zip_data.len());
        self.storage.write_file(&self.filename, &zip_data).await
    }
}
