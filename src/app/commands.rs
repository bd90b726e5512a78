use crate::adapters::{InMemoryRecordStore, LocalStorage, SqliteRecordStore};
use crate::config::cli::{AddArgs, Command};
use crate::config::Settings;
use crate::core::catalog::Catalog;
use crate::core::etl::EtlEngine;
use crate::core::export::{ArchiveExportPipeline, TsvExportPipeline, DEFAULT_ARCHIVE_FILENAME};
use crate::core::import::{parse_row, seed_store, TsvImportPipeline};
use crate::core::statistics::StatisticsEngine;
use crate::domain::model::{
    format_enroll_date, format_score, Aggregate, Attribute, Field, StudentRecord, Subject,
};
use crate::domain::ports::RecordStore;
use crate::utils::error::{GradebookError, Result};
use std::collections::HashMap;

/// Opens the configured store, applies the seed file and runs one command.
pub async fn run(settings: &Settings, command: &Command) -> Result<String> {
    if settings.in_memory {
        tracing::debug!("Using in-memory store");
        run_with_store(settings, InMemoryRecordStore::new(), command).await
    } else {
        let store = SqliteRecordStore::open(&settings.database_path)?;
        run_with_store(settings, store, command).await
    }
}

async fn run_with_store<R>(settings: &Settings, store: R, command: &Command) -> Result<String>
where
    R: RecordStore + Clone,
{
    if let Some(report) = seed_store(settings, store.clone()).await? {
        tracing::info!(
            "Seed file applied: {} inserted, {} already present, {} rejected",
            report.inserted,
            report.skipped,
            report.rejected
        );
    }
    execute(settings, store, command).await
}

pub async fn execute<R>(settings: &Settings, store: R, command: &Command) -> Result<String>
where
    R: RecordStore + Clone,
{
    match command {
        Command::Import { file } => {
            let pipeline =
                TsvImportPipeline::new(LocalStorage::new("."), store, file.clone(), settings.max_score);
            let report = EtlEngine::new(pipeline).run().await?;
            Ok(format!(
                "Imported {} students ({} already stored, {} rejected)",
                report.inserted, report.skipped, report.rejected
            ))
        }
        Command::Export { file } => {
            let filename = file.clone().unwrap_or_else(|| settings.export_filename.clone());
            let pipeline =
                TsvExportPipeline::new(LocalStorage::new(settings.output_path.clone()), store, filename);
            let path = EtlEngine::new(pipeline).run().await?;
            Ok(format!("Data exported successfully to: {}", path))
        }
        Command::Archive { file } => {
            let filename = file
                .clone()
                .unwrap_or_else(|| DEFAULT_ARCHIVE_FILENAME.to_string());
            let pipeline = ArchiveExportPipeline::new(
                LocalStorage::new(settings.output_path.clone()),
                store,
                filename,
            );
            let path = EtlEngine::new(pipeline).run().await?;
            Ok(format!("Report archive written to: {}", path))
        }
        Command::Add(args) => {
            let record = record_from_args(args, settings.max_score)?;
            store.create(&record).await?;
            tracing::info!("Added student {}", record.id);
            Ok(format!("Successfully added student {}", record.id))
        }
        Command::Show { id } => {
            let record = store.read(id).await?;
            let summary = StatisticsEngine::new(&store).summary().await?;
            let mut out = format_record(&record);
            out.push_str("\nSubject statistics:\n");
            for (subject, result) in summary {
                out.push_str(&format_summary_line(subject, result)?);
                out.push('\n');
            }
            Ok(out.trim_end().to_string())
        }
        Command::Get { id, attribute } => {
            let attribute: Attribute = attribute.parse()?;
            let catalog = Catalog::load(&store).await?;
            Ok(catalog.attribute(id, attribute)?.to_string())
        }
        Command::Update { id, field, value } => {
            let field: Field = field.parse()?;
            let value = field.parse_value(value, settings.max_score)?;
            let updated = store.update(id, field, value).await?;
            tracing::info!("Updated {} for student {}", field, id);
            Ok(format!(
                "Update successful: {} of student {} is now '{}'",
                field,
                updated.id,
                updated.attribute(Attribute::Field(field))
            ))
        }
        Command::Delete { id } => {
            store.delete(id).await?;
            tracing::info!("Deleted student {}", id);
            Ok(format!("Student {} successfully deleted.", id))
        }
        Command::List => {
            let catalog = Catalog::load(&store).await?;
            let mut lines = vec![format!("{} students", catalog.len())];
            lines.extend(
                catalog
                    .records()
                    .iter()
                    .map(|record| format!("{}\t{}", record.id, record.name)),
            );
            Ok(lines.join("\n"))
        }
        Command::Stats { subject } => {
            let engine = StatisticsEngine::new(&store);
            match subject {
                Some(name) => {
                    let subject: Subject = name.parse()?;
                    let aggregate = engine.aggregate(subject).await?;
                    Ok(format_aggregate(&aggregate))
                }
                None => {
                    let mut lines = Vec::new();
                    for (subject, result) in engine.summary().await? {
                        lines.push(format_summary_line(subject, result)?);
                    }
                    Ok(lines.join("\n"))
                }
            }
        }
    }
}

fn record_from_args(args: &AddArgs, max_score: f64) -> Result<StudentRecord> {
    let mut cells: HashMap<String, String> = HashMap::new();
    cells.insert("ID".to_string(), args.id.clone());
    cells.insert("Name".to_string(), args.name.clone());
    cells.insert("Gender".to_string(), args.gender.clone());
    cells.insert("Enroll_Date".to_string(), args.enroll_date.clone());

    let scores = [
        (Subject::English, &args.english),
        (Subject::Math, &args.math),
        (Subject::History, &args.history),
        (Subject::Science, &args.science),
        (Subject::Arts, &args.arts),
    ];
    for (subject, score) in scores {
        if let Some(score) = score {
            cells.insert(subject.column().to_string(), score.clone());
        }
    }

    parse_row(&cells, max_score)
}

fn format_record(record: &StudentRecord) -> String {
    let mut lines = vec![
        format!("ID:          {}", record.id),
        format!("Name:        {}", record.name),
        format!("Gender:      {}", record.gender),
        format!("Enrolled:    {}", format_enroll_date(record.enroll_date)),
    ];
    lines.extend(Subject::ALL.into_iter().map(|subject| {
        format!(
            "{:<12} {}",
            format!("{}:", subject),
            format_score(record.score(subject))
        )
    }));
    lines.join("\n") + "\n"
}

fn format_aggregate(aggregate: &Aggregate) -> String {
    format!(
        "{}: max {}, min {}, mean {:.2} ({} students)",
        aggregate.subject, aggregate.max, aggregate.min, aggregate.mean, aggregate.count
    )
}

/// An empty subject is reported as such; any other error is propagated.
fn format_summary_line(subject: Subject, result: Result<Aggregate>) -> Result<String> {
    match result {
        Ok(aggregate) => Ok(format_aggregate(&aggregate)),
        Err(GradebookError::EmptySet { .. }) => Ok(format!("{}: no scores recorded", subject)),
        Err(e) => Err(e),
    }
}
