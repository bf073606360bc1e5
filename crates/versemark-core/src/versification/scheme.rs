//! Table-driven versification schemes
//!
//! A scheme is an ordered list of books, each with a verse count per chapter.
//! Ordinals are zero-based positions of a verse across the whole scheme.
//!
//! Schemes are defined in TOML:
//!
//! ```toml
//! name = "KJVA"
//!
//! [[books]]
//! osis = "Gen"
//! name = "Genesis"
//! chapters = [31, 25, 24]
//!
//! # Optional: verses that land somewhere else in the canonical scheme
//! [[mappings]]
//! from = "Ps.10.1"
//! to = "Ps.9.22"
//! ```

use std::collections::HashMap;

use serde::Deserialize;

use super::{Ordinal, Verse, VersificationError};

/// A book as defined in a scheme file
#[derive(Debug, Clone, Deserialize)]
pub struct BookDef {
    /// OSIS identifier, e.g. `Gen`
    pub osis: String,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Verse count for each chapter, in order
    pub chapters: Vec<u16>,
}

#[derive(Debug, Deserialize)]
struct MappingDef {
    from: String,
    to: String,
}

#[derive(Debug, Deserialize)]
struct SchemeDef {
    name: String,
    books: Vec<BookDef>,
    #[serde(default)]
    mappings: Vec<MappingDef>,
}

/// One versification scheme with precomputed ordinal offsets
#[derive(Debug, Clone)]
pub struct Versification {
    name: String,
    books: Vec<BookDef>,
    book_index: HashMap<String, usize>,
    /// Ordinal of the first verse of each book
    book_offsets: Vec<Ordinal>,
    /// Ordinal of the first verse of each chapter, per book
    chapter_offsets: Vec<Vec<Ordinal>>,
    verse_count: Ordinal,
    /// Source verse -> canonical verse
    to_canonical: HashMap<Verse, Verse>,
    /// Canonical verse -> source verse (first mapping wins)
    from_canonical: HashMap<Verse, Verse>,
}

impl Versification {
    /// Parse a scheme from its TOML definition
    pub fn from_toml_str(content: &str) -> Result<Self, VersificationError> {
        let def: SchemeDef =
            toml::from_str(content).map_err(|e| VersificationError::Definition {
                scheme: "(unparsed)".to_string(),
                details: e.to_string(),
            })?;
        Self::from_def(def)
    }

    /// Build a scheme from books alone (no mappings)
    pub fn new(name: impl Into<String>, books: Vec<BookDef>) -> Result<Self, VersificationError> {
        Self::from_def(SchemeDef {
            name: name.into(),
            books,
            mappings: Vec::new(),
        })
    }

    fn from_def(def: SchemeDef) -> Result<Self, VersificationError> {
        let definition_error = |details: String| VersificationError::Definition {
            scheme: def.name.clone(),
            details,
        };

        if def.name.trim().is_empty() {
            return Err(definition_error("scheme name is empty".to_string()));
        }
        if def.books.is_empty() {
            return Err(definition_error("scheme defines no books".to_string()));
        }

        let mut book_index = HashMap::with_capacity(def.books.len());
        let mut book_offsets = Vec::with_capacity(def.books.len());
        let mut chapter_offsets = Vec::with_capacity(def.books.len());
        let mut next: Ordinal = 0;

        for (i, book) in def.books.iter().enumerate() {
            if book.chapters.is_empty() {
                return Err(definition_error(format!("book {} has no chapters", book.osis)));
            }
            if book.chapters.len() > usize::from(u16::MAX) {
                return Err(definition_error(format!(
                    "book {} has more than {} chapters",
                    book.osis,
                    u16::MAX
                )));
            }
            if book.chapters.iter().any(|&count| count == 0) {
                return Err(definition_error(format!(
                    "book {} has a chapter without verses",
                    book.osis
                )));
            }
            if book_index.insert(book.osis.clone(), i).is_some() {
                return Err(definition_error(format!("duplicate book {}", book.osis)));
            }

            book_offsets.push(next);
            let mut offsets = Vec::with_capacity(book.chapters.len());
            for &count in &book.chapters {
                offsets.push(next);
                next += Ordinal::from(count);
            }
            chapter_offsets.push(offsets);
        }

        let mut scheme = Self {
            name: def.name.clone(),
            books: def.books,
            book_index,
            book_offsets,
            chapter_offsets,
            verse_count: next,
            to_canonical: HashMap::new(),
            from_canonical: HashMap::new(),
        };

        for mapping in def.mappings {
            let from: Verse = mapping.from.parse()?;
            let to: Verse = mapping.to.parse()?;
            scheme.ordinal(&from)?;
            scheme.from_canonical.entry(to.clone()).or_insert_with(|| from.clone());
            scheme.to_canonical.insert(from, to);
        }

        Ok(scheme)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// OSIS identifiers of all books, in scheme order
    pub fn book_ids(&self) -> impl Iterator<Item = &str> {
        self.books.iter().map(|b| b.osis.as_str())
    }

    pub fn book(&self, osis: &str) -> Option<&BookDef> {
        self.book_index.get(osis).map(|&i| &self.books[i])
    }

    /// Total number of verses in the scheme
    pub fn verse_count(&self) -> Ordinal {
        self.verse_count
    }

    /// Explicit canonical target for a verse of this scheme, if any
    pub fn mapped_to_canonical(&self, verse: &Verse) -> Option<&Verse> {
        self.to_canonical.get(verse)
    }

    /// Explicit source verse for a canonical verse, if any
    pub fn mapped_from_canonical(&self, verse: &Verse) -> Option<&Verse> {
        self.from_canonical.get(verse)
    }

    /// Canonical targets of all explicit mappings
    pub fn mapping_targets(&self) -> impl Iterator<Item = &Verse> {
        self.to_canonical.values()
    }

    /// Ordinal of a verse in this scheme
    pub fn ordinal(&self, verse: &Verse) -> Result<Ordinal, VersificationError> {
        let b = self.book_position(&verse.book)?;
        let chapters = &self.books[b].chapters;

        let chapter = usize::from(verse.chapter);
        if chapter == 0 || chapter > chapters.len() {
            return Err(self.invalid_verse(verse));
        }
        if verse.verse == 0 || verse.verse > chapters[chapter - 1] {
            return Err(self.invalid_verse(verse));
        }

        Ok(self.chapter_offsets[b][chapter - 1] + Ordinal::from(verse.verse) - 1)
    }

    /// Verse at an ordinal of this scheme
    pub fn verse(&self, ordinal: Ordinal) -> Result<Verse, VersificationError> {
        if ordinal >= self.verse_count {
            return Err(VersificationError::OrdinalOutOfRange {
                scheme: self.name.clone(),
                ordinal,
            });
        }

        // Offsets are ascending and start at 0, so the partition point is at least 1
        let b = self.book_offsets.partition_point(|&o| o <= ordinal) - 1;
        let offsets = &self.chapter_offsets[b];
        let c = offsets.partition_point(|&o| o <= ordinal) - 1;

        // Chapter and verse numbers are bounded by u16 counts in the definition
        let chapter = (c + 1) as u16;
        let verse = (ordinal - offsets[c] + 1) as u16;
        Ok(Verse::new(self.books[b].osis.clone(), chapter, verse))
    }

    /// First and last ordinal of a book
    pub fn book_bounds(&self, osis: &str) -> Result<(Ordinal, Ordinal), VersificationError> {
        let b = self.book_position(osis)?;
        let start = self.book_offsets[b];
        let end = self
            .book_offsets
            .get(b + 1)
            .copied()
            .unwrap_or(self.verse_count)
            - 1;
        Ok((start, end))
    }

    /// Last verse of a book
    pub fn last_verse(&self, osis: &str) -> Result<Verse, VersificationError> {
        let (_, end) = self.book_bounds(osis)?;
        self.verse(end)
    }

    /// Nearest verse of this scheme with the same book, chapter and verse numbers
    ///
    /// Chapter and verse are clamped to what exists in this scheme. Returns
    /// `None` when the book is not part of the scheme.
    pub fn clamp(&self, verse: &Verse) -> Option<Verse> {
        let book = self.book(&verse.book)?;
        let last_chapter = u16::try_from(book.chapters.len()).unwrap_or(u16::MAX);
        let chapter = verse.chapter.clamp(1, last_chapter);
        let last_verse = book.chapters[usize::from(chapter) - 1];
        Some(Verse::new(
            verse.book.clone(),
            chapter,
            verse.verse.clamp(1, last_verse),
        ))
    }

    fn book_position(&self, osis: &str) -> Result<usize, VersificationError> {
        self.book_index
            .get(osis)
            .copied()
            .ok_or_else(|| VersificationError::UnknownBook {
                scheme: self.name.clone(),
                book: osis.to_string(),
            })
    }

    fn invalid_verse(&self, verse: &Verse) -> VersificationError {
        VersificationError::InvalidVerse {
            scheme: self.name.clone(),
            verse: verse.to_string(),
        }
    }
}
