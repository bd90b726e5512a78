// Application layer: wires CLI commands to the store, catalog, statistics and pipelines.

pub mod commands;

pub use commands::{execute, run};
