//! SQLite-backed persistence adapter: schema init/migration, a connection
//! wrapper with transaction helpers, and per-entity query modules. Higher
//! layers never see SQL; they call into `queries::*` with domain types.

pub mod db;
pub mod error;
pub mod queries;
pub mod records;
pub mod schema;

pub use db::Database;
pub use error::{Error, Result};
