//! Database module: row models and SQL repositories.
//!
//! - `model`: row structs decoded straight from SQLite and their conversion
//!   into domain entities.
//! - `repo`: pool setup, migrations and the SQL write helpers used by the
//!   fixture loader.
//!
//! Read queries used by the aggregation engine live in
//! [`crate::store::SqliteStore`].

pub mod model;
pub mod repo;

pub use repo::*;

pub use model::{CategoryRow, ItemRow};
