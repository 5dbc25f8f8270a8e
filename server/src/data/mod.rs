//! Data layer: SQLite service, schema, repositories, and row types

pub mod sqlite;
pub mod types;

pub use sqlite::{SqliteError, SqliteService};
