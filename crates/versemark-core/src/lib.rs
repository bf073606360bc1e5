//! Versemark Core Library
//!
//! Verse-anchored bookmarks and labels persisted in SQLite.
//!
//! # Architecture
//!
//! - **Canonical ordinals**: every bookmark range is stored as a pair of
//!   ordinals in one canonical versification scheme, so bookmarks created
//!   under different numbering schemes can be queried together.
//! - **SQLite**: one connection behind a mutex; every write is a single
//!   IMMEDIATE transaction.
//!
//! # Quick Start
//!
//! ```text
//! let store = Store::open()?;
//!
//! // Bookmark a range, labelled
//! let label = store.labels().insert(&NewLabel::new("Promises"))?;
//! let bookmark = store.add_bookmark(&"Gen.12.1-3".parse()?, "KJVA", None, &[label])?;
//!
//! // What covers this verse?
//! let hits = store.bookmarks_for_verse(&"Gen.12.2".parse()?, "KJVA")?;
//! ```
//!
//! # Modules
//!
//! - `store`: scheme-aware facade (main entry point)
//! - `storage`: SQLite stores for bookmarks, labels and associations
//! - `versification`: conversion between numbering schemes
//! - `models`: data structures for bookmarks and labels
//! - `config`: application configuration

pub mod config;
pub mod models;
pub mod storage;
pub mod store;
pub mod versification;

pub use config::Config;
pub use models::{
    AssociationId, Bookmark, BookmarkId, BookmarkSortOrder, BookmarkStyle, BookmarkToLabel,
    Label, LabelId, NewBookmark, NewLabel,
};
pub use storage::{AssociationStore, BookmarkStore, Database, LabelStore, StoreError, StoreResult};
pub use store::Store;
pub use versification::{
    Ordinal, OrdinalConverter, SchemeRegistry, Verse, VerseRange, VersificationError,
};
