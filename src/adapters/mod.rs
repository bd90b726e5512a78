// Adapters layer: concrete implementations of the domain ports (SQLite, in-memory, local files).

pub mod db;
pub mod memory;
pub mod sqlite;
pub mod storage;

pub use memory::InMemoryRecordStore;
pub use sqlite::SqliteRecordStore;
pub use storage::LocalStorage;
