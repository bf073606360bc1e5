//! Verse references
//!
//! References are written OSIS-style: `Gen.1.1`. Ranges are written as
//! `Gen.1.1-Gen.1.5`, `Gen.1.1-2.3` (same book) or `Gen.1.1-5` (same chapter).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::VersificationError;

/// A single verse position, independent of any numbering scheme
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Verse {
    /// OSIS book identifier, e.g. `Gen`
    pub book: String,
    /// One-based chapter number
    pub chapter: u16,
    /// One-based verse number
    pub verse: u16,
}

impl Verse {
    pub fn new(book: impl Into<String>, chapter: u16, verse: u16) -> Self {
        Self {
            book: book.into(),
            chapter,
            verse,
        }
    }
}

impl fmt::Display for Verse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.book, self.chapter, self.verse)
    }
}

impl FromStr for Verse {
    type Err = VersificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersificationError::InvalidReference(s.to_string());

        let mut parts = s.trim().split('.');
        let book = parts.next().filter(|b| !b.is_empty()).ok_or_else(invalid)?;
        let chapter = parse_number(parts.next()).ok_or_else(invalid)?;
        let verse = parse_number(parts.next()).ok_or_else(invalid)?;
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Verse::new(book, chapter, verse))
    }
}

/// An inclusive range of verses within one numbering scheme
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRange {
    pub start: Verse,
    pub end: Verse,
}

impl VerseRange {
    pub fn new(start: Verse, end: Verse) -> Self {
        Self { start, end }
    }

    /// A range covering exactly one verse
    pub fn single(verse: Verse) -> Self {
        Self {
            start: verse.clone(),
            end: verse,
        }
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }
}

impl From<Verse> for VerseRange {
    fn from(verse: Verse) -> Self {
        VerseRange::single(verse)
    }
}

impl fmt::Display for VerseRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else if self.start.book != self.end.book {
            write!(f, "{}-{}", self.start, self.end)
        } else if self.start.chapter != self.end.chapter {
            write!(f, "{}-{}.{}", self.start, self.end.chapter, self.end.verse)
        } else {
            write!(f, "{}-{}", self.start, self.end.verse)
        }
    }
}

impl FromStr for VerseRange {
    type Err = VersificationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersificationError::InvalidReference(s.to_string());

        let Some((start, end)) = s.trim().split_once('-') else {
            return Ok(VerseRange::single(s.parse()?));
        };

        let start: Verse = start.parse().map_err(|_| invalid())?;
        let parts: Vec<&str> = end.trim().split('.').collect();
        let end = match parts.as_slice() {
            [verse] => Verse::new(
                start.book.clone(),
                start.chapter,
                parse_number(Some(*verse)).ok_or_else(invalid)?,
            ),
            [chapter, verse] => Verse::new(
                start.book.clone(),
                parse_number(Some(*chapter)).ok_or_else(invalid)?,
                parse_number(Some(*verse)).ok_or_else(invalid)?,
            ),
            [_, _, _] => end.parse().map_err(|_| invalid())?,
            _ => return Err(invalid()),
        };

        Ok(VerseRange::new(start, end))
    }
}

fn parse_number(part: Option<&str>) -> Option<u16> {
    part.and_then(|p| p.trim().parse::<u16>().ok())
        .filter(|n| *n > 0)
}
