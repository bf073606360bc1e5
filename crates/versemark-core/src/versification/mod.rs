//! Versification
//!
//! Converts verse positions expressed in any supported numbering scheme into
//! ordinals of a single canonical scheme, and back. All bookmark range
//! queries run on canonical ordinals so bookmarks created under different
//! schemes stay comparable.
//!
//! - `OrdinalConverter`: the conversion boundary used by the `Store`
//! - `SchemeRegistry`: table-driven implementation backed by TOML scheme files
//! - `Verse` / `VerseRange`: scheme-independent references

pub mod registry;
pub mod scheme;
pub mod verse;

pub use registry::SchemeRegistry;
pub use scheme::{BookDef, Versification};
pub use verse::{Verse, VerseRange};

use thiserror::Error;

/// Position of a verse within a scheme, counted from zero
pub type Ordinal = u32;

/// Errors raised while converting between schemes
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VersificationError {
    /// The requested scheme is not registered
    #[error("Unsupported versification scheme: '{0}'")]
    UnsupportedScheme(String),

    /// The book does not exist in the scheme
    #[error("Book '{book}' does not exist in {scheme}")]
    UnknownBook { scheme: String, book: String },

    /// Chapter or verse number outside the scheme
    #[error("Verse '{verse}' does not exist in {scheme}")]
    InvalidVerse { scheme: String, verse: String },

    /// Ordinal past the last verse of the scheme
    #[error("Ordinal {ordinal} is out of range for {scheme}")]
    OrdinalOutOfRange { scheme: String, ordinal: Ordinal },

    /// Range whose canonical start lies after its end
    #[error("Range starts at {start} but ends earlier at {end}")]
    InvertedRange { start: String, end: String },

    /// Reference text that could not be parsed
    #[error("Invalid verse reference '{0}'")]
    InvalidReference(String),

    /// Scheme definition is malformed
    #[error("Invalid definition for scheme {scheme}: {details}")]
    Definition { scheme: String, details: String },
}

/// Converts positions between a source scheme and the canonical scheme
///
/// Implementations must be deterministic and total over every valid
/// position of every scheme they report as supported.
pub trait OrdinalConverter: Send + Sync {
    /// Name of the canonical scheme
    fn canonical_scheme(&self) -> &str;

    /// Canonical ordinal of a verse given in `scheme`
    fn to_canonical(&self, verse: &Verse, scheme: &str) -> Result<Ordinal, VersificationError>;

    /// Verse in `scheme` corresponding to a canonical ordinal
    fn from_canonical(&self, ordinal: Ordinal, scheme: &str)
        -> Result<Verse, VersificationError>;

    /// Ordinal of a verse within its own scheme
    fn to_source_ordinal(&self, verse: &Verse, scheme: &str)
        -> Result<Ordinal, VersificationError>;

    /// Valid book identifiers of `scheme`, in scheme order
    fn books(&self, scheme: &str) -> Result<Vec<String>, VersificationError>;

    /// Canonical bounds of a whole book of `scheme`
    fn book_range(&self, book: &str, scheme: &str)
        -> Result<(Ordinal, Ordinal), VersificationError>;

    /// Canonical bounds of a range given in `scheme`
    fn range_to_canonical(
        &self,
        range: &VerseRange,
        scheme: &str,
    ) -> Result<(Ordinal, Ordinal), VersificationError> {
        let start = self.to_canonical(&range.start, scheme)?;
        let end = self.to_canonical(&range.end, scheme)?;
        if start > end {
            return Err(VersificationError::InvertedRange {
                start: range.start.to_string(),
                end: range.end.to_string(),
            });
        }
        Ok((start, end))
    }
}
