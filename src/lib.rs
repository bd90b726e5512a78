pub mod adapters;
#[cfg(feature = "cli")]
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::{CliConfig, Command};
pub use crate::config::{toml_config::TomlConfig, Settings};

pub use crate::adapters::{InMemoryRecordStore, LocalStorage, SqliteRecordStore};
pub use crate::core::{
    catalog::Catalog, etl::EtlEngine, export::TsvExportPipeline, import::TsvImportPipeline,
    statistics::StatisticsEngine,
};
pub use crate::domain::model::{Aggregate, Attribute, Field, FieldValue, StudentRecord, Subject};
pub use crate::domain::ports::RecordStore;
pub use crate::utils::error::{GradebookError, Result};
