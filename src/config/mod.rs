#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::core::export::DEFAULT_EXPORT_FILENAME;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{validate_file_extension, validate_path, validate_positive, Validate};
use toml_config::{TomlConfig, DEFAULT_MAX_SCORE};

pub const DEFAULT_DATABASE_PATH: &str = "student.db";

/// Effective settings after layering CLI flags over an optional TOML file.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: String,
    pub output_path: String,
    pub seed_file: Option<String>,
    pub max_score: f64,
    pub export_filename: String,
    pub in_memory: bool,
    pub json_logs: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
            output_path: ".".to_string(),
            seed_file: None,
            max_score: DEFAULT_MAX_SCORE,
            export_filename: DEFAULT_EXPORT_FILENAME.to_string(),
            in_memory: false,
            json_logs: false,
        }
    }
}

impl From<&TomlConfig> for Settings {
    fn from(config: &TomlConfig) -> Self {
        Self {
            database_path: config.database_path().to_string(),
            output_path: config.output_path().to_string(),
            seed_file: config.seed_file().map(str::to_string),
            max_score: config.max_score(),
            export_filename: config
                .export_filename()
                .unwrap_or(DEFAULT_EXPORT_FILENAME)
                .to_string(),
            in_memory: false,
            json_logs: config.json_logs(),
        }
    }
}

#[cfg(feature = "cli")]
impl Settings {
    pub fn from_cli(cli: &cli::CliConfig) -> Result<Self> {
        let mut settings = match &cli.config {
            Some(path) => {
                let config = TomlConfig::from_file(path)?;
                config.validate()?;
                Settings::from(&config)
            }
            None => Settings::default(),
        };

        if let Some(database) = &cli.database {
            settings.database_path = database.clone();
        }
        if let Some(output_path) = &cli.output_path {
            settings.output_path = output_path.clone();
        }
        if let Some(seed_file) = &cli.seed_file {
            settings.seed_file = Some(seed_file.clone());
        }
        if let Some(max_score) = cli.max_score {
            settings.max_score = max_score;
        }
        settings.in_memory |= cli.in_memory;
        settings.json_logs |= cli.json_logs;

        Ok(settings)
    }
}

impl ConfigProvider for Settings {
    fn database_path(&self) -> &str {
        &self.database_path
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn seed_file(&self) -> Option<&str> {
        self.seed_file.as_deref()
    }

    fn max_score(&self) -> f64 {
        self.max_score
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        if !self.in_memory {
            validate_path("database", &self.database_path)?;
        }
        validate_path("output_path", &self.output_path)?;
        validate_path("export_filename", &self.export_filename)?;
        if let Some(seed_file) = &self.seed_file {
            validate_file_extension("seed_file", seed_file, &["tsv"])?;
        }
        validate_positive("max_score", self.max_score)
    }
}
