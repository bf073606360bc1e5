//! Bookmark command handlers

use anyhow::{Context, Result};

use versemark_core::{
    Bookmark, BookmarkId, BookmarkSortOrder, LabelId, Store, Verse, VerseRange,
};

use crate::output::{BookmarkView, Output};

/// Create a bookmark for a range
pub fn add(
    store: &Store,
    range: VerseRange,
    scheme: &str,
    note: Option<String>,
    labels: Vec<LabelId>,
    output: &Output,
) -> Result<()> {
    let bookmark = store
        .add_bookmark(&range, scheme, note, &labels)
        .with_context(|| format!("Failed to bookmark {}", range))?;

    output.success(&format!("Created bookmark: {}", bookmark.id));
    output.print_bookmark(&view(store, &bookmark, scheme)?);
    Ok(())
}

/// List bookmarks, optionally restricted to a label or to unlabelled ones
pub fn list(
    store: &Store,
    order: BookmarkSortOrder,
    label: Option<LabelId>,
    unlabelled: bool,
    scheme: &str,
    output: &Output,
) -> Result<()> {
    let bookmarks = match label {
        Some(label_id) => store.bookmarks_with_label(label_id, order)?,
        None if unlabelled => store.unlabelled_bookmarks(order)?,
        None => store.all_bookmarks(order)?,
    };
    print_all(store, &bookmarks, scheme, output)
}

/// Show one bookmark
pub fn show(store: &Store, id: BookmarkId, scheme: &str, output: &Output) -> Result<()> {
    let bookmark = find(store, id)?;
    output.print_bookmark(&view(store, &bookmark, scheme)?);
    Ok(())
}

/// Bookmarks containing a verse
pub fn at(store: &Store, verse: Verse, scheme: &str, output: &Output) -> Result<()> {
    let bookmarks = store.bookmarks_for_verse(&verse, scheme)?;
    print_all(store, &bookmarks, scheme, output)
}

/// Bookmarks starting exactly at a verse, optionally carrying a label
pub fn starting(
    store: &Store,
    verse: Verse,
    label: Option<LabelId>,
    scheme: &str,
    output: &Output,
) -> Result<()> {
    let bookmarks = match label {
        Some(label_id) => store.bookmarks_for_verse_start_with_label(label_id, &verse, scheme)?,
        None => store.bookmarks_starting_at_verse(&verse, scheme)?,
    };
    print_all(store, &bookmarks, scheme, output)
}

/// Bookmarks overlapping a range
pub fn range(store: &Store, range: VerseRange, scheme: &str, output: &Output) -> Result<()> {
    let bookmarks = store.bookmarks_for_verse_range(&range, scheme)?;
    print_all(store, &bookmarks, scheme, output)
}

/// Bookmarks overlapping a whole book
pub fn book(store: &Store, book: String, scheme: &str, output: &Output) -> Result<()> {
    let bookmarks = store.bookmarks_in_book(&book, scheme)?;
    print_all(store, &bookmarks, scheme, output)
}

/// Bump a bookmark to the top of the recent list
pub fn touch(store: &Store, id: BookmarkId, scheme: &str, output: &Output) -> Result<()> {
    let bookmark = store.touch_bookmark(id)?;
    output.success(&format!("Touched bookmark: {}", id));
    output.print_bookmark(&view(store, &bookmark, scheme)?);
    Ok(())
}

/// Replace the label set of a bookmark
pub fn set_labels(store: &Store, id: BookmarkId, labels: Vec<LabelId>, output: &Output) -> Result<()> {
    let labels = store.associations().set_labels(id, &labels)?;
    output.success(&format!("Bookmark {} now has {} label(s)", id, labels.len()));
    Ok(())
}

/// Delete a bookmark
pub fn delete(store: &Store, id: BookmarkId, output: &Output) -> Result<()> {
    store
        .delete_bookmark(id)
        .with_context(|| format!("Failed to delete bookmark {}", id))?;
    output.success(&format!("Deleted bookmark: {}", id));
    Ok(())
}

fn find(store: &Store, id: BookmarkId) -> Result<Bookmark> {
    store
        .bookmarks()
        .by_id(id)?
        .ok_or_else(|| anyhow::anyhow!("Bookmark not found: {}", id))
}

fn print_all(store: &Store, bookmarks: &[Bookmark], scheme: &str, output: &Output) -> Result<()> {
    let views = bookmarks
        .iter()
        .map(|bookmark| view(store, bookmark, scheme))
        .collect::<Result<Vec<_>>>()?;
    output.print_bookmarks(&views);
    Ok(())
}

/// Render a bookmark with its range in `scheme` and its label names
pub(crate) fn view(store: &Store, bookmark: &Bookmark, scheme: &str) -> Result<BookmarkView> {
    let range = store
        .display_range(bookmark, scheme)
        .with_context(|| format!("Failed to render bookmark {} in {}", bookmark.id, scheme))?;
    let labels = store
        .associations()
        .labels_for(bookmark.id)?
        .into_iter()
        .map(|label| {
            if label.name.is_empty() {
                label
                    .bookmark_style
                    .map(|style| style.to_string())
                    .unwrap_or_default()
            } else {
                label.name
            }
        })
        .collect();

    Ok(BookmarkView {
        id: bookmark.id,
        reference: range.to_string(),
        scheme: scheme.to_string(),
        notes: bookmark.notes.clone(),
        labels,
        created_at: bookmark.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use versemark_core::{Database, NewLabel, SchemeRegistry};

    const KJVA: &str = r#"
        name = "KJVA"

        [[books]]
        osis = "John"
        chapters = [51, 25, 36]
    "#;

    fn test_store() -> Store {
        let registry = SchemeRegistry::from_toml_strs("KJVA", [KJVA]).unwrap();
        Store::new(Database::open_in_memory().unwrap(), Arc::new(registry))
    }

    #[test]
    fn test_view_renders_reference_and_labels() {
        let store = test_store();
        let label = store.labels().insert(&NewLabel::new("Gospel")).unwrap();
        let speak = store.speak_label().unwrap();

        let bookmark = store
            .add_bookmark(
                &"John.3.16-17".parse().unwrap(),
                "KJVA",
                Some("For God so loved".to_string()),
                &[label, speak.id],
            )
            .unwrap();

        let view = view(&store, &bookmark, "KJVA").unwrap();
        assert_eq!(view.reference, "John.3.16-17");
        assert_eq!(view.labels, vec!["SPEAK".to_string(), "Gospel".to_string()]);
        assert_eq!(view.notes.as_deref(), Some("For God so loved"));
    }

    #[test]
    fn test_find_missing_bookmark() {
        let store = test_store();
        let err = find(&store, BookmarkId(12)).unwrap_err();
        assert!(err.to_string().contains("Bookmark not found: 12"));
    }

    #[test]
    fn test_view_in_unknown_scheme_fails() {
        let store = test_store();
        let bookmark = store
            .add_bookmark(&"John.1.1".parse().unwrap(), "KJVA", None, &[])
            .unwrap();
        assert!(view(&store, &bookmark, "Vulgate").is_err());
    }
}
