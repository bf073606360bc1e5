//! Unified storage interface
//!
//! The `Store` translates verse references given in any registered scheme
//! into canonical ordinals and delegates to the bookmark, label and
//! association stores. It holds no state of its own beyond the database
//! handle and the converter.
//!
//! ## Usage
//!
//! ```ignore
//! let store = Store::open()?;
//!
//! let range: VerseRange = "Gen.1.1-3".parse()?;
//! let bookmark = store.add_bookmark(&range, "KJVA", None, &[])?;
//!
//! let here = store.bookmarks_for_verse(&"Gen.1.2".parse()?, "KJVA")?;
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::models::{
    Bookmark, BookmarkId, BookmarkSortOrder, BookmarkStyle, BookmarkToLabel, Label, LabelId,
    NewBookmark,
};
use crate::storage::associations::insert_pair;
use crate::storage::bookmarks::insert_bookmark;
use crate::storage::{
    AssociationStore, BookmarkStore, Database, LabelStore, StoreError, StoreResult,
};
use crate::versification::{OrdinalConverter, SchemeRegistry, Verse, VerseRange};

/// Scheme-aware entry point over the bookmark database
pub struct Store {
    db: Database,
    converter: Arc<dyn OrdinalConverter>,
}

impl Store {
    /// Open the store using the default configuration
    pub fn open() -> Result<Self> {
        let config = Config::load().context("Failed to load configuration")?;
        Self::open_with_config(&config)
    }

    /// Open the store with a specific configuration
    ///
    /// Loads every scheme in the configured versification directory and
    /// opens (or creates) the SQLite database.
    pub fn open_with_config(config: &Config) -> Result<Self> {
        let schemes_dir = config.versification_dir();
        let registry = SchemeRegistry::load_dir(&schemes_dir, &config.canonical_scheme)
            .with_context(|| format!("Failed to load versification schemes from {:?}", schemes_dir))?;

        let db = Database::open(&config.sqlite_path()).context("Failed to open SQLite database")?;

        Ok(Self::new(db, Arc::new(registry)))
    }

    /// Build a store from an open database and a converter
    pub fn new(db: Database, converter: Arc<dyn OrdinalConverter>) -> Self {
        Self { db, converter }
    }

    pub fn bookmarks(&self) -> BookmarkStore<'_> {
        BookmarkStore::new(&self.db)
    }

    pub fn labels(&self) -> LabelStore<'_> {
        LabelStore::new(&self.db)
    }

    pub fn associations(&self) -> AssociationStore<'_> {
        AssociationStore::new(&self.db)
    }

    pub fn converter(&self) -> &dyn OrdinalConverter {
        self.converter.as_ref()
    }

    // ==================== Bookmark operations ====================

    /// Create a bookmark for a range given in `scheme`, with its initial labels
    ///
    /// The bookmark and its associations are stored in one transaction.
    pub fn add_bookmark(
        &self,
        range: &VerseRange,
        scheme: &str,
        notes: Option<String>,
        labels: &[LabelId],
    ) -> StoreResult<Bookmark> {
        let (start, end) = self.converter.range_to_canonical(range, scheme)?;
        let source_start = self.converter.to_source_ordinal(&range.start, scheme)?;
        let source_end = self.converter.to_source_ordinal(&range.end, scheme)?;

        let new = NewBookmark::new(scheme, start, end)
            .with_source_ordinals(source_start, source_end)
            .with_notes(notes);

        let id = self.db.write(|tx| {
            let id = insert_bookmark(tx, &new)?;
            for label_id in labels {
                insert_pair(tx, &BookmarkToLabel::new(id, *label_id))?;
            }
            Ok(id)
        })?;

        Ok(new.into_bookmark(id))
    }

    /// Stamp a bookmark's `created_at` with the current time
    pub fn touch_bookmark(&self, id: BookmarkId) -> StoreResult<Bookmark> {
        let bookmarks = self.bookmarks();
        let bookmark = bookmarks
            .by_id(id)?
            .ok_or_else(|| StoreError::not_found("Bookmark", id.0))?;
        bookmarks.touch(&bookmark)
    }

    /// Delete a bookmark and all of its label associations
    pub fn delete_bookmark(&self, id: BookmarkId) -> StoreResult<()> {
        self.bookmarks().delete(id)
    }

    /// Delete a label and all of its bookmark associations
    pub fn delete_label(&self, id: LabelId) -> StoreResult<()> {
        self.labels().delete(id)
    }

    /// The reserved label used for read-aloud bookmarks
    pub fn speak_label(&self) -> StoreResult<Label> {
        self.labels().get_or_create_reserved(BookmarkStyle::Speak)
    }

    // ==================== Scheme-aware queries ====================

    /// Bookmarks overlapping a range given in `scheme`
    pub fn bookmarks_for_verse_range(
        &self,
        range: &VerseRange,
        scheme: &str,
    ) -> StoreResult<Vec<Bookmark>> {
        let (start, end) = self.converter.range_to_canonical(range, scheme)?;
        self.bookmarks().for_range(start, end)
    }

    /// Bookmarks overlapping any part of a book
    pub fn bookmarks_in_book(&self, book: &str, scheme: &str) -> StoreResult<Vec<Bookmark>> {
        let (start, end) = self.converter.book_range(book, scheme)?;
        self.bookmarks().for_range(start, end)
    }

    /// Bookmarks containing a verse
    pub fn bookmarks_for_verse(&self, verse: &Verse, scheme: &str) -> StoreResult<Vec<Bookmark>> {
        let ordinal = self.converter.to_canonical(verse, scheme)?;
        self.bookmarks().for_point(ordinal)
    }

    /// Bookmarks starting exactly at a verse
    pub fn bookmarks_starting_at_verse(
        &self,
        verse: &Verse,
        scheme: &str,
    ) -> StoreResult<Vec<Bookmark>> {
        let ordinal = self.converter.to_canonical(verse, scheme)?;
        self.bookmarks().for_exact_start(ordinal)
    }

    pub fn has_bookmarks_for_verse(&self, verse: &Verse, scheme: &str) -> StoreResult<bool> {
        let ordinal = self.converter.to_canonical(verse, scheme)?;
        self.bookmarks().has_any(ordinal)
    }

    /// Bookmarks carrying `label_id` that start exactly at a verse
    pub fn bookmarks_for_verse_start_with_label(
        &self,
        label_id: LabelId,
        verse: &Verse,
        scheme: &str,
    ) -> StoreResult<Vec<Bookmark>> {
        let ordinal = self.converter.to_canonical(verse, scheme)?;
        self.bookmarks().with_label_at_exact_start(label_id, ordinal)
    }

    pub fn all_bookmarks(&self, order: BookmarkSortOrder) -> StoreResult<Vec<Bookmark>> {
        self.bookmarks().all(order)
    }

    pub fn unlabelled_bookmarks(&self, order: BookmarkSortOrder) -> StoreResult<Vec<Bookmark>> {
        self.bookmarks().unlabelled(order)
    }

    pub fn bookmarks_with_label(
        &self,
        label_id: LabelId,
        order: BookmarkSortOrder,
    ) -> StoreResult<Vec<Bookmark>> {
        self.bookmarks().with_label(label_id, order)
    }

    /// Render a bookmark's range in `scheme`
    pub fn display_range(&self, bookmark: &Bookmark, scheme: &str) -> StoreResult<VerseRange> {
        let start = self.converter.from_canonical(bookmark.kjv_ordinal_start, scheme)?;
        let end = self.converter.from_canonical(bookmark.kjv_ordinal_end, scheme)?;
        Ok(VerseRange::new(start, end))
    }
}
