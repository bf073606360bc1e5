//! Scheme registry
//!
//! Holds the canonical scheme plus every source scheme and implements
//! `OrdinalConverter` over them.
//!
//! Conversion to canonical: an explicit mapping of the source verse wins,
//! otherwise the same book/chapter/verse is used, clamped to what exists in
//! the canonical scheme. The inverse follows the reverse mappings, then the
//! same clamping into the source scheme.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use super::{Ordinal, OrdinalConverter, Verse, Versification, VersificationError};

/// Registered versification schemes, keyed by name
#[derive(Debug, Clone)]
pub struct SchemeRegistry {
    canonical: String,
    schemes: BTreeMap<String, Versification>,
}

impl SchemeRegistry {
    /// Create a registry around its canonical scheme
    pub fn new(canonical: Versification) -> Self {
        let name = canonical.name().to_string();
        let mut schemes = BTreeMap::new();
        schemes.insert(name.clone(), canonical);
        Self {
            canonical: name,
            schemes,
        }
    }

    /// Build a registry from TOML definitions
    ///
    /// One of the definitions must be named `canonical`.
    pub fn from_toml_strs<'a>(
        canonical: &str,
        definitions: impl IntoIterator<Item = &'a str>,
    ) -> Result<Self, VersificationError> {
        let parsed = definitions
            .into_iter()
            .map(Versification::from_toml_str)
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_schemes(canonical, parsed)
    }

    /// Load every `*.toml` scheme file in a directory
    ///
    /// Files that fail to parse, and schemes whose mappings do not fit the
    /// canonical scheme, are skipped with a warning. A missing canonical
    /// scheme is an error.
    pub fn load_dir(dir: &Path, canonical: &str) -> Result<Self> {
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read versification directory {:?}", dir))?;

        let mut parsed = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("toml") {
                continue;
            }

            let content = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read scheme file {:?}", path))?;
            match Versification::from_toml_str(&content) {
                Ok(scheme) => parsed.push(scheme),
                Err(e) => warn!("Skipping scheme file {:?}: {}", path, e),
            }
        }

        let Some(position) = parsed.iter().position(|s| s.name() == canonical) else {
            bail!(
                "Canonical scheme '{}' not found in {:?}",
                canonical,
                dir
            );
        };

        let mut registry = Self::new(parsed.swap_remove(position));
        for scheme in parsed {
            let name = scheme.name().to_string();
            if let Err(e) = registry.register(scheme) {
                warn!("Skipping scheme {} from {:?}: {}", name, dir, e);
            }
        }
        info!(
            "Loaded {} versification scheme(s) from {:?}",
            registry.schemes.len(),
            dir
        );
        Ok(registry)
    }

    fn from_schemes(
        canonical: &str,
        mut schemes: Vec<Versification>,
    ) -> Result<Self, VersificationError> {
        let position = schemes
            .iter()
            .position(|s| s.name() == canonical)
            .ok_or_else(|| VersificationError::UnsupportedScheme(canonical.to_string()))?;

        let mut registry = Self::new(schemes.swap_remove(position));
        for scheme in schemes {
            registry.register(scheme)?;
        }
        Ok(registry)
    }

    /// Add a source scheme
    ///
    /// Every explicit mapping must point at a verse of the canonical scheme.
    pub fn register(&mut self, scheme: Versification) -> Result<(), VersificationError> {
        if self.schemes.contains_key(scheme.name()) {
            return Err(VersificationError::Definition {
                scheme: scheme.name().to_string(),
                details: "scheme is already registered".to_string(),
            });
        }

        let canonical = self.canonical();
        for target in scheme.mapping_targets() {
            canonical
                .ordinal(target)
                .map_err(|e| VersificationError::Definition {
                    scheme: scheme.name().to_string(),
                    details: format!("mapping target {}: {}", target, e),
                })?;
        }

        self.schemes.insert(scheme.name().to_string(), scheme);
        Ok(())
    }

    pub fn canonical(&self) -> &Versification {
        &self.schemes[&self.canonical]
    }

    /// Look up a scheme by name
    pub fn scheme(&self, name: &str) -> Result<&Versification, VersificationError> {
        self.schemes
            .get(name)
            .ok_or_else(|| VersificationError::UnsupportedScheme(name.to_string()))
    }

    /// Names of all registered schemes
    pub fn scheme_names(&self) -> impl Iterator<Item = &str> {
        self.schemes.keys().map(String::as_str)
    }
}

impl OrdinalConverter for SchemeRegistry {
    fn canonical_scheme(&self) -> &str {
        &self.canonical
    }

    fn to_canonical(&self, verse: &Verse, scheme: &str) -> Result<Ordinal, VersificationError> {
        let source = self.scheme(scheme)?;
        source.ordinal(verse)?;

        let canonical = self.canonical();
        let target = match source.mapped_to_canonical(verse) {
            Some(mapped) => mapped.clone(),
            None => canonical
                .clamp(verse)
                .ok_or_else(|| VersificationError::UnknownBook {
                    scheme: canonical.name().to_string(),
                    book: verse.book.clone(),
                })?,
        };
        canonical.ordinal(&target)
    }

    fn from_canonical(
        &self,
        ordinal: Ordinal,
        scheme: &str,
    ) -> Result<Verse, VersificationError> {
        let source = self.scheme(scheme)?;
        let verse = self.canonical().verse(ordinal)?;

        match source.mapped_from_canonical(&verse) {
            Some(mapped) => Ok(mapped.clone()),
            None => source
                .clamp(&verse)
                .ok_or_else(|| VersificationError::UnknownBook {
                    scheme: source.name().to_string(),
                    book: verse.book.clone(),
                }),
        }
    }

    fn to_source_ordinal(
        &self,
        verse: &Verse,
        scheme: &str,
    ) -> Result<Ordinal, VersificationError> {
        self.scheme(scheme)?.ordinal(verse)
    }

    fn books(&self, scheme: &str) -> Result<Vec<String>, VersificationError> {
        Ok(self
            .scheme(scheme)?
            .book_ids()
            .map(str::to_string)
            .collect())
    }

    fn book_range(
        &self,
        book: &str,
        scheme: &str,
    ) -> Result<(Ordinal, Ordinal), VersificationError> {
        let source = self.scheme(scheme)?;
        let first = Verse::new(book, 1, 1);
        let last = source.last_verse(book)?;

        let start = self.to_canonical(&first, scheme)?;
        let end = self.to_canonical(&last, scheme)?;
        Ok((start.min(end), start.max(end)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::versification::VerseRange;
    use tempfile::TempDir;

    const CANONICAL: &str = r#"
        name = "KJVA"

        [[books]]
        osis = "Gen"
        chapters = [3, 4]

        [[books]]
        osis = "Ps"
        chapters = [2, 5]
    "#;

    // Psalm 1 has one extra verse; Psalm 2 is shifted by one
    const SHIFTED: &str = r#"
        name = "Shifted"

        [[books]]
        osis = "Gen"
        chapters = [3, 4]

        [[books]]
        osis = "Ps"
        chapters = [3, 4]

        [[mappings]]
        from = "Ps.1.3"
        to = "Ps.2.1"

        [[mappings]]
        from = "Ps.2.1"
        to = "Ps.2.2"

        [[mappings]]
        from = "Ps.2.2"
        to = "Ps.2.3"

        [[mappings]]
        from = "Ps.2.3"
        to = "Ps.2.4"

        [[mappings]]
        from = "Ps.2.4"
        to = "Ps.2.5"
    "#;

    const GEN_ONLY: &str = r#"
        name = "GenOnly"

        [[books]]
        osis = "Gen"
        chapters = [5]

        [[books]]
        osis = "Tob"
        chapters = [2]
    "#;

    fn registry() -> SchemeRegistry {
        SchemeRegistry::from_toml_strs("KJVA", [CANONICAL, SHIFTED, GEN_ONLY]).unwrap()
    }

    #[test]
    fn test_canonical_is_identity() {
        let registry = registry();
        for ordinal in 0..registry.canonical().verse_count() {
            let verse = registry.from_canonical(ordinal, "KJVA").unwrap();
            assert_eq!(registry.to_canonical(&verse, "KJVA").unwrap(), ordinal);
        }
    }

    #[test]
    fn test_explicit_mappings() {
        let registry = registry();
        let ps_2_1 = registry
            .canonical()
            .ordinal(&Verse::new("Ps", 2, 1))
            .unwrap();

        assert_eq!(
            registry
                .to_canonical(&Verse::new("Ps", 1, 3), "Shifted")
                .unwrap(),
            ps_2_1
        );
        assert_eq!(
            registry.from_canonical(ps_2_1, "Shifted").unwrap(),
            Verse::new("Ps", 1, 3)
        );
        // Unmapped verses keep their numbers
        assert_eq!(
            registry
                .to_canonical(&Verse::new("Gen", 2, 2), "Shifted")
                .unwrap(),
            4
        );
    }

    #[test]
    fn test_clamps_verses_missing_from_canonical() {
        let registry = registry();
        // GenOnly has Gen.1.5; canonical Gen.1 ends at verse 3
        assert_eq!(
            registry
                .to_canonical(&Verse::new("Gen", 1, 5), "GenOnly")
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_book_missing_from_canonical() {
        let registry = registry();
        assert!(matches!(
            registry.to_canonical(&Verse::new("Tob", 1, 1), "GenOnly"),
            Err(VersificationError::UnknownBook { .. })
        ));
    }

    #[test]
    fn test_unsupported_scheme() {
        let registry = registry();
        assert_eq!(
            registry.to_canonical(&Verse::new("Gen", 1, 1), "Vulgate"),
            Err(VersificationError::UnsupportedScheme("Vulgate".to_string()))
        );
        assert!(registry.books("Vulgate").is_err());
    }

    #[test]
    fn test_invalid_source_position() {
        let registry = registry();
        assert!(matches!(
            registry.to_canonical(&Verse::new("Ps", 1, 3), "KJVA"),
            Err(VersificationError::InvalidVerse { .. })
        ));
    }

    #[test]
    fn test_range_to_canonical() {
        let registry = registry();
        let range: VerseRange = "Ps.1.2-2.1".parse().unwrap();
        assert_eq!(registry.range_to_canonical(&range, "Shifted").unwrap(), (8, 10));

        let inverted: VerseRange = "Gen.2.1-Gen.1.1".parse().unwrap();
        assert!(matches!(
            registry.range_to_canonical(&inverted, "KJVA"),
            Err(VersificationError::InvertedRange { .. })
        ));
    }

    #[test]
    fn test_book_range_and_books() {
        let registry = registry();
        assert_eq!(registry.book_range("Ps", "KJVA").unwrap(), (7, 13));
        assert_eq!(registry.book_range("Ps", "Shifted").unwrap(), (7, 13));
        assert_eq!(registry.books("GenOnly").unwrap(), vec!["Gen", "Tob"]);
    }

    #[test]
    fn test_register_rejects_bad_mapping_target() {
        let mut registry = SchemeRegistry::from_toml_strs("KJVA", [CANONICAL]).unwrap();
        let bad = Versification::from_toml_str(
            r#"
            name = "Bad"
            [[books]]
            osis = "Gen"
            chapters = [3]
            [[mappings]]
            from = "Gen.1.1"
            to = "Gen.9.9"
            "#,
        )
        .unwrap();
        assert!(matches!(
            registry.register(bad),
            Err(VersificationError::Definition { .. })
        ));
    }

    #[test]
    fn test_load_dir() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("kjva.toml"), CANONICAL).unwrap();
        fs::write(dir.path().join("shifted.toml"), SHIFTED).unwrap();
        fs::write(dir.path().join("broken.toml"), "name = ").unwrap();
        fs::write(dir.path().join("README.md"), "not a scheme").unwrap();

        let registry = SchemeRegistry::load_dir(dir.path(), "KJVA").unwrap();
        let names: Vec<_> = registry.scheme_names().collect();
        assert_eq!(names, vec!["KJVA", "Shifted"]);

        assert!(SchemeRegistry::load_dir(dir.path(), "Vulgate").is_err());
    }

    #[test]
    fn test_load_dir_skips_scheme_with_unknown_mapping_target() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("kjva.toml"), CANONICAL).unwrap();
        fs::write(dir.path().join("shifted.toml"), SHIFTED).unwrap();
        fs::write(
            dir.path().join("bad.toml"),
            r#"
                name = "Bad"

                [[books]]
                osis = "Gen"
                chapters = [3]

                [[mappings]]
                from = "Gen.1.1"
                to = "Gen.9.9"
            "#,
        )
        .unwrap();

        let registry = SchemeRegistry::load_dir(dir.path(), "KJVA").unwrap();
        let names: Vec<_> = registry.scheme_names().collect();
        assert_eq!(names, vec!["KJVA", "Shifted"]);
        assert!(registry.books("Bad").is_err());
    }
}
