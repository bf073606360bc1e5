//! Data models for versemark
//!
//! Defines the core data structures: Bookmark, Label and the
//! BookmarkToLabel association, plus the identifiers and enumerations
//! that go with them.
//!
//! Entities without a store-assigned id are represented by separate
//! `New*` types; inserting one returns the id, and `into_*` rebuilds the
//! full entity from it.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use crate::versification::Ordinal;

macro_rules! row_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.0))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                i64::column_result(value).map($name)
            }
        }
    };
}

row_id!(
    /// Store-assigned bookmark identifier
    BookmarkId
);
row_id!(
    /// Store-assigned label identifier
    LabelId
);
row_id!(
    /// Row identifier of a bookmark-label association
    AssociationId
);

/// Current time at the millisecond precision timestamps are stored with
pub fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A bookmark anchored to a verse range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    /// Unique identifier, assigned on insert
    pub id: BookmarkId,
    /// First canonical ordinal of the range
    pub kjv_ordinal_start: Ordinal,
    /// Last canonical ordinal of the range (inclusive)
    pub kjv_ordinal_end: Ordinal,
    /// First ordinal in the scheme the bookmark was created in
    pub ordinal_start: Ordinal,
    /// Last ordinal in the scheme the bookmark was created in
    pub ordinal_end: Ordinal,
    /// Name of the scheme the bookmark was created in
    pub versification: String,
    /// Free-form notes
    pub notes: Option<String>,
    /// Creation time, bumped by touch updates
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Whether the canonical range contains the ordinal
    pub fn contains(&self, ordinal: Ordinal) -> bool {
        self.kjv_ordinal_start <= ordinal && ordinal <= self.kjv_ordinal_end
    }

    /// Whether the canonical range intersects `[start, end]`, boundaries included
    pub fn overlaps(&self, start: Ordinal, end: Ordinal) -> bool {
        self.kjv_ordinal_start <= end && self.kjv_ordinal_end >= start
    }
}

/// A bookmark that has not been stored yet
#[derive(Debug, Clone, PartialEq)]
pub struct NewBookmark {
    pub kjv_ordinal_start: Ordinal,
    pub kjv_ordinal_end: Ordinal,
    pub ordinal_start: Ordinal,
    pub ordinal_end: Ordinal,
    pub versification: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl NewBookmark {
    /// Create a bookmark over canonical ordinals, recorded in the canonical scheme
    pub fn new(versification: impl Into<String>, start: Ordinal, end: Ordinal) -> Self {
        Self {
            kjv_ordinal_start: start,
            kjv_ordinal_end: end,
            ordinal_start: start,
            ordinal_end: end,
            versification: versification.into(),
            notes: None,
            created_at: now(),
        }
    }

    /// Record the ordinals the range had in its source scheme
    pub fn with_source_ordinals(mut self, start: Ordinal, end: Ordinal) -> Self {
        self.ordinal_start = start;
        self.ordinal_end = end;
        self
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Rebuild the full entity once the store has assigned an id
    pub fn into_bookmark(self, id: BookmarkId) -> Bookmark {
        Bookmark {
            id,
            kjv_ordinal_start: self.kjv_ordinal_start,
            kjv_ordinal_end: self.kjv_ordinal_end,
            ordinal_start: self.ordinal_start,
            ordinal_end: self.ordinal_end,
            versification: self.versification,
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

/// Visual style of a label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookmarkStyle {
    YellowStar,
    RedHighlight,
    YellowHighlight,
    GreenHighlight,
    BlueHighlight,
    Underline,
    /// Reserved for the label attached by text-to-speech bookmarking
    Speak,
}

impl BookmarkStyle {
    pub const ALL: [BookmarkStyle; 7] = [
        BookmarkStyle::YellowStar,
        BookmarkStyle::RedHighlight,
        BookmarkStyle::YellowHighlight,
        BookmarkStyle::GreenHighlight,
        BookmarkStyle::BlueHighlight,
        BookmarkStyle::Underline,
        BookmarkStyle::Speak,
    ];

    /// Stored representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkStyle::YellowStar => "YELLOW_STAR",
            BookmarkStyle::RedHighlight => "RED_HIGHLIGHT",
            BookmarkStyle::YellowHighlight => "YELLOW_HIGHLIGHT",
            BookmarkStyle::GreenHighlight => "GREEN_HIGHLIGHT",
            BookmarkStyle::BlueHighlight => "BLUE_HIGHLIGHT",
            BookmarkStyle::Underline => "UNDERLINE",
            BookmarkStyle::Speak => "SPEAK",
        }
    }

    /// Reserved styles belong to at most one label, created on demand
    pub fn is_reserved(&self) -> bool {
        matches!(self, BookmarkStyle::Speak)
    }
}

impl fmt::Display for BookmarkStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookmarkStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('-', "_").to_ascii_uppercase();
        BookmarkStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == normalized)
            .ok_or_else(|| format!("unknown bookmark style '{}'", s))
    }
}

impl ToSql for BookmarkStyle {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BookmarkStyle {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let text = value.as_str()?;
        text.parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

/// A user-defined label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Label {
    /// Unique identifier, assigned on insert
    pub id: LabelId,
    /// Display name (not unique)
    pub name: String,
    /// Optional style
    pub bookmark_style: Option<BookmarkStyle>,
}

/// A label that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLabel {
    pub name: String,
    pub bookmark_style: Option<BookmarkStyle>,
}

impl NewLabel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bookmark_style: None,
        }
    }

    pub fn with_style(mut self, style: BookmarkStyle) -> Self {
        self.bookmark_style = Some(style);
        self
    }

    /// Rebuild the full entity once the store has assigned an id
    pub fn into_label(self, id: LabelId) -> Label {
        Label {
            id,
            name: self.name,
            bookmark_style: self.bookmark_style,
        }
    }
}

/// Link between one bookmark and one label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookmarkToLabel {
    pub bookmark_id: BookmarkId,
    pub label_id: LabelId,
}

impl BookmarkToLabel {
    pub fn new(bookmark_id: BookmarkId, label_id: LabelId) -> Self {
        Self {
            bookmark_id,
            label_id,
        }
    }
}

/// Named orderings for bookmark listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookmarkSortOrder {
    /// Canonical document position, earliest first
    #[default]
    BibleOrder,
    /// Most recently created first
    CreatedAt,
}

impl BookmarkSortOrder {
    /// ORDER BY fragment for the `bookmark` table
    pub(crate) fn order_clause(&self) -> &'static str {
        match self {
            BookmarkSortOrder::BibleOrder => {
                "bookmark.kjv_ordinal_start ASC, bookmark.kjv_ordinal_end ASC, bookmark.id ASC"
            }
            BookmarkSortOrder::CreatedAt => "bookmark.created_at DESC, bookmark.id DESC",
        }
    }
}

impl FromStr for BookmarkSortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "bible-order" | "bible" => Ok(BookmarkSortOrder::BibleOrder),
            "created-at" | "recent" => Ok(BookmarkSortOrder::CreatedAt),
            other => Err(format!(
                "unknown sort order '{}' (expected bible-order or created-at)",
                other
            )),
        }
    }
}
