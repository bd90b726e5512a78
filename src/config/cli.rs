use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "gradebook")]
#[command(about = "Student records and per-subject grade statistics")]
pub struct CliConfig {
    /// TOML configuration file; CLI flags override its values
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// SQLite database file
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// Directory for exported files
    #[arg(long, global = true)]
    pub output_path: Option<String>,

    /// TSV file imported (insert-or-ignore) on every start
    #[arg(long, global = true)]
    pub seed_file: Option<String>,

    /// Highest accepted score
    #[arg(long, global = true)]
    pub max_score: Option<f64>,

    /// Keep records in memory only
    #[arg(long, global = true)]
    pub in_memory: bool,

    #[arg(short, long, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON lines")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import students from a TSV file, skipping IDs already stored
    Import { file: String },
    /// Write all students to a TSV file
    Export {
        #[arg(long)]
        file: Option<String>,
    },
    /// Write a ZIP with the TSV export and per-subject statistics
    Archive {
        #[arg(long)]
        file: Option<String>,
    },
    /// Add a new student
    Add(AddArgs),
    /// Show a student together with the statistics of every subject
    Show { id: String },
    /// Print one attribute of a student
    Get { id: String, attribute: String },
    /// Overwrite one field of a student
    Update {
        id: String,
        field: String,
        value: String,
    },
    /// Delete a student
    Delete { id: String },
    /// List all students
    List,
    /// Max, min and mean for one subject, or for all of them
    Stats { subject: Option<String> },
}

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    #[arg(long)]
    pub id: String,
    #[arg(long)]
    pub name: String,
    #[arg(long, default_value = "")]
    pub gender: String,
    /// Enrollment date as M-D-YYYY
    #[arg(long, default_value = "")]
    pub enroll_date: String,
    #[arg(long)]
    pub english: Option<String>,
    #[arg(long)]
    pub math: Option<String>,
    #[arg(long)]
    pub history: Option<String>,
    #[arg(long)]
    pub science: Option<String>,
    #[arg(long)]
    pub arts: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_update_command() {
        let cli = CliConfig::parse_from([
            "gradebook",
            "--database",
            "check_student.db",
            "update",
            "53821",
            "English",
            "85",
        ]);
        assert_eq!(cli.database.as_deref(), Some("check_student.db"));
        match cli.command {
            Command::Update { id, field, value } => {
                assert_eq!((id.as_str(), field.as_str(), value.as_str()), ("53821", "English", "85"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = CliConfig::parse_from(["gradebook", "stats", "Math", "--in-memory", "-v"]);
        assert!(cli.in_memory);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Stats { subject: Some(ref s) } if s == "Math"));
    }

    #[test]
    fn test_parse_add_command() {
        let cli = CliConfig::parse_from([
            "gradebook", "add", "--id", "1", "--name", "Ann", "--math", "90",
        ]);
        match cli.command {
            Command::Add(args) => {
                assert_eq!(args.id, "1");
                assert_eq!(args.math.as_deref(), Some("90"));
                assert_eq!(args.english, None);
                assert_eq!(args.gender, "");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
