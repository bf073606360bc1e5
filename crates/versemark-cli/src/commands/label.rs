//! Label command handlers

use anyhow::{bail, Context, Result};

use versemark_core::{BookmarkId, BookmarkStyle, Label, LabelId, NewLabel, Store};

use crate::output::Output;

/// Create a label
pub fn create(
    store: &Store,
    name: String,
    style: Option<BookmarkStyle>,
    output: &Output,
) -> Result<()> {
    let mut new = NewLabel::new(name);
    if let Some(style) = style {
        new = new.with_style(style);
    }
    let id = store.labels().insert(&new).context("Failed to create label")?;

    output.success(&format!("Created label: {}", id));
    output.print_label(&new.into_label(id));
    Ok(())
}

/// List all labels with bookmark counts
pub fn list(store: &Store, output: &Output) -> Result<()> {
    let labels = store.labels().all_with_counts()?;
    output.print_labels(&labels);
    Ok(())
}

/// Rename a label
pub fn rename(store: &Store, id: LabelId, name: String, output: &Output) -> Result<()> {
    let label = Label {
        name,
        ..find(store, id)?
    };
    store.labels().update(&label)?;
    output.success(&format!("Renamed label {} to '{}'", id, label.name));
    Ok(())
}

/// Change or clear the style of a label
pub fn restyle(store: &Store, id: LabelId, style: String, output: &Output) -> Result<()> {
    let bookmark_style = parse_optional_style(&style)?;
    let label = Label {
        bookmark_style,
        ..find(store, id)?
    };
    store.labels().update(&label)?;
    output.success(&format!("Set style of label {} to {}", id, style));
    Ok(())
}

/// Delete a label, detaching it from every bookmark
pub fn delete(store: &Store, id: LabelId, output: &Output) -> Result<()> {
    let attached = store.associations().count_for_label(id)?;
    store
        .delete_label(id)
        .with_context(|| format!("Failed to delete label {}", id))?;
    output.success(&format!(
        "Deleted label {} (detached from {} bookmark(s))",
        id, attached
    ));
    Ok(())
}

/// Show the reserved speak label, creating it on first use
pub fn speak(store: &Store, output: &Output) -> Result<()> {
    let label = store.speak_label()?;
    output.print_label(&label);
    Ok(())
}

/// Attach a label to a bookmark
pub fn attach(store: &Store, bookmark: BookmarkId, label: LabelId, output: &Output) -> Result<()> {
    store
        .associations()
        .insert(bookmark, label)
        .with_context(|| format!("Failed to attach label {} to bookmark {}", label, bookmark))?;
    output.success(&format!("Attached label {} to bookmark {}", label, bookmark));
    Ok(())
}

/// Detach a label from a bookmark
pub fn detach(store: &Store, bookmark: BookmarkId, label: LabelId, output: &Output) -> Result<()> {
    let removed = store.associations().delete(bookmark, label)?;
    if removed == 0 {
        output.message(&format!("Bookmark {} does not have label {}", bookmark, label));
    } else {
        output.success(&format!("Detached label {} from bookmark {}", label, bookmark));
    }
    Ok(())
}

fn find(store: &Store, id: LabelId) -> Result<Label> {
    store
        .labels()
        .by_id(id)?
        .ok_or_else(|| anyhow::anyhow!("Label not found: {}", id))
}

/// Parse a style name, where `none` clears the style
fn parse_optional_style(value: &str) -> Result<Option<BookmarkStyle>> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    match value.parse() {
        Ok(style) => Ok(Some(style)),
        Err(e) => bail!("{}", e),
    }
}
