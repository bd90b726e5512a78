pub mod catalog;
pub mod etl;
pub mod export;
pub mod import;
pub mod statistics;

pub use crate::domain::model::{Aggregate, ImportReport, StudentRecord, Subject};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RecordStore, Storage};
pub use crate::utils::error::Result;
