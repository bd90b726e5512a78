//! SQLite connection management and schema bootstrap.

use crate::utils::error::Result;
use rusqlite::Connection;
use std::path::Path;
use std::time::Duration;

const CREATE_STUDENT_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS student (
        ID TEXT PRIMARY KEY NOT NULL,
        Name TEXT NOT NULL,
        Gender TEXT,
        Enroll_Date TEXT,
        English REAL,
        Math REAL,
        History REAL,
        Science REAL,
        Arts REAL
    );
";

/// Open a SQLite database at the given path, creating the file if needed
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(Connection::open(path)?)
}

/// Open an in-memory SQLite database
pub fn open_in_memory() -> Result<Connection> {
    Ok(Connection::open_in_memory()?)
}

pub fn configure(conn: &Connection) -> Result<()> {
    conn.busy_timeout(Duration::from_secs(5))?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    Ok(())
}

/// Creates the `student` table when it does not exist yet.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(CREATE_STUDENT_TABLE)?;
    tracing::debug!("Student table ready");
    Ok(())
}
