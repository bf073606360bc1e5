//! Storage layer
//!
//! SQLite persistence for bookmarks, labels and their associations.
//!
//! - `Database`: connection ownership and transaction discipline
//! - `BookmarkStore`, `LabelStore`, `AssociationStore`: per-entity operations
//! - `schema`: table and index definitions

pub mod associations;
pub mod bookmarks;
pub mod database;
pub mod error;
pub mod labels;
pub mod schema;

pub use associations::AssociationStore;
pub use bookmarks::BookmarkStore;
pub use database::Database;
pub use error::{StoreError, StoreResult};
pub use labels::LabelStore;
pub use schema::{get_schema_version, init_schema, needs_init, SCHEMA_VERSION};
