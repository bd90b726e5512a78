use crate::domain::model::{Aggregate, StudentRecord, Subject};
use crate::domain::ports::RecordStore;
use crate::utils::error::{GradebookError, Result};

/// Max, min and arithmetic mean over the records that carry `subject`.
/// Records without a score for it are skipped.
pub fn aggregate_records(records: &[StudentRecord], subject: Subject) -> Result<Aggregate> {
    let scores: Vec<f64> = records.iter().filter_map(|r| r.score(subject)).collect();

    if scores.is_empty() {
        return Err(GradebookError::EmptySet {
            subject: subject.to_string(),
        });
    }

    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;

    Ok(Aggregate {
        subject,
        max,
        min,
        mean,
        count: scores.len(),
    })
}

pub struct StatisticsEngine<'a, R: RecordStore + ?Sized> {
    store: &'a R,
}

impl<'a, R: RecordStore + ?Sized> StatisticsEngine<'a, R> {
    pub fn new(store: &'a R) -> Self {
        Self { store }
    }

    pub async fn aggregate(&self, subject: Subject) -> Result<Aggregate> {
        let records = self.store.list_all().await?;
        let aggregate = aggregate_records(&records, subject)?;
        tracing::debug!(
            "{}: max={} min={} mean={:.2} over {} students",
            subject,
            aggregate.max,
            aggregate.min,
            aggregate.mean,
            aggregate.count
        );
        Ok(aggregate)
    }

    /// Every subject from a single listing.
    pub async fn summary(&self) -> Result<Vec<(Subject, Result<Aggregate>)>> {
        let records = self.store.list_all().await?;
        Ok(Subject::ALL
            .into_iter()
            .map(|subject| (subject, aggregate_records(&records, subject)))
            .collect())
    }
}
