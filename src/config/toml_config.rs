use crate::core::ConfigProvider;
use crate::utils::error::{GradebookError, Result};
use crate::utils::validation::{validate_file_extension, validate_path, validate_positive, Validate};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_MAX_SCORE: f64 = 100.0;

#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    pub database: DatabaseConfig,
    pub import: Option<ImportConfig>,
    pub export: Option<ExportConfig>,
    pub grading: Option<GradingConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    pub seed_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExportConfig {
    pub output_path: String,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GradingConfig {
    pub max_score: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(GradebookError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| GradebookError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are kept verbatim.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| GradebookError::ConfigValidationError {
            field: "environment".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn export_filename(&self) -> Option<&str> {
        self.export.as_ref().and_then(|e| e.filename.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.json)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn database_path(&self) -> &str {
        &self.database.path
    }

    fn output_path(&self) -> &str {
        self.export
            .as_ref()
            .map(|e| e.output_path.as_str())
            .unwrap_or(".")
    }

    fn seed_file(&self) -> Option<&str> {
        self.import.as_ref().and_then(|i| i.seed_file.as_deref())
    }

    fn max_score(&self) -> f64 {
        self.grading
            .as_ref()
            .map(|g| g.max_score)
            .unwrap_or(DEFAULT_MAX_SCORE)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_path("database.path", &self.database.path)?;
        validate_path("export.output_path", self.output_path())?;
        if let Some(seed_file) = self.seed_file() {
            validate_file_extension("import.seed_file", seed_file, &["tsv"])?;
        }
        validate_positive("grading.max_score", self.max_score())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[database]
path = "check_student.db"

[import]
seed_file = "student.tsv"

[export]
output_path = "./exports"
filename = "roster.tsv"

[grading]
max_score = 150.0

[logging]
json = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.database_path(), "check_student.db");
        assert_eq!(config.seed_file(), Some("student.tsv"));
        assert_eq!(config.output_path(), "./exports");
        assert_eq!(config.export_filename(), Some("roster.tsv"));
        assert_eq!(config.max_score(), 150.0);
        assert!(config.json_logs());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_optional_sections_use_defaults() {
        let config = TomlConfig::from_toml_str("[database]\npath = \"student.db\"\n").unwrap();

        assert_eq!(config.output_path(), ".");
        assert_eq!(config.seed_file(), None);
        assert_eq!(config.max_score(), DEFAULT_MAX_SCORE);
        assert!(!config.json_logs());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("GRADEBOOK_TEST_DB", "/tmp/from-env.db");

        let config = TomlConfig::from_toml_str(
            "[database]\npath = \"${GRADEBOOK_TEST_DB}\"\n",
        )
        .unwrap();
        assert_eq!(config.database_path(), "/tmp/from-env.db");

        std::env::remove_var("GRADEBOOK_TEST_DB");
    }

    #[test]
    fn test_config_validation() {
        let config = TomlConfig::from_toml_str(
            "[database]\npath = \"student.db\"\n[import]\nseed_file = \"student.csv\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());

        let config = TomlConfig::from_toml_str(
            "[database]\npath = \"student.db\"\n[grading]\nmax_score = 0.0\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_database_section_fails() {
        assert!(matches!(
            TomlConfig::from_toml_str("[grading]\nmax_score = 10.0\n"),
            Err(GradebookError::ConfigValidationError { .. })
        ));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[database]\npath = \"file-test.db\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.database_path(), "file-test.db");
    }
}
