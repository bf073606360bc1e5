//! Label store
//!
//! Labels carry an optional style. Reserved styles (currently only
//! `SPEAK`) belong to at most one label, which is created on first use by
//! `get_or_create_reserved`.

use rusqlite::{params, Connection, OptionalExtension, Params, Row};
use tracing::debug;

use super::associations::delete_for_label;
use super::database::Database;
use super::error::{StoreError, StoreResult};
use crate::models::{BookmarkStyle, Label, LabelId, NewLabel};

const LABEL_COLUMNS: &str = "label.id, label.name, label.bookmark_style";

/// Label queries and mutations
pub struct LabelStore<'a> {
    db: &'a Database,
}

impl<'a> LabelStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a label, returning its new id
    ///
    /// Fails with a constraint error when the style is reserved and a
    /// label with that style already exists.
    pub fn insert(&self, label: &NewLabel) -> StoreResult<LabelId> {
        self.db.write(|tx| {
            if let Some(style) = label.bookmark_style.filter(BookmarkStyle::is_reserved) {
                if find_by_style(tx, style)?.is_some() {
                    return Err(reserved_taken(style));
                }
            }
            insert_label(tx, label)
        })
    }

    /// Rename or restyle a label
    pub fn update(&self, label: &Label) -> StoreResult<()> {
        self.db.write(|tx| {
            if let Some(style) = label.bookmark_style.filter(BookmarkStyle::is_reserved) {
                if let Some(holder) = find_by_style(tx, style)? {
                    if holder.id != label.id {
                        return Err(reserved_taken(style));
                    }
                }
            }

            let changed = tx.execute(
                "UPDATE label SET name = ?2, bookmark_style = ?3 WHERE id = ?1",
                params![label.id, label.name, label.bookmark_style],
            )?;
            if changed == 0 {
                return Err(StoreError::not_found("Label", label.id.0));
            }
            debug!("Updated label {}", label.id);
            Ok(())
        })
    }

    /// Delete a label together with all of its bookmark associations
    pub fn delete(&self, id: LabelId) -> StoreResult<()> {
        self.db.write(|tx| {
            let unlinked = delete_for_label(tx, id)?;
            let deleted = tx.execute("DELETE FROM label WHERE id = ?", params![id])?;
            if deleted == 0 {
                return Err(StoreError::not_found("Label", id.0));
            }
            debug!("Deleted label {} ({} association(s))", id, unlinked);
            Ok(())
        })
    }

    pub fn by_id(&self, id: LabelId) -> StoreResult<Option<Label>> {
        self.db.read(|conn| {
            Ok(conn
                .query_row(
                    &format!("SELECT {} FROM label WHERE label.id = ?", LABEL_COLUMNS),
                    params![id],
                    row_to_label,
                )
                .optional()?)
        })
    }

    /// All labels ordered by name
    pub fn all_sorted_by_name(&self) -> StoreResult<Vec<Label>> {
        self.db.read(|conn| {
            query_labels(
                conn,
                &format!("SELECT {} FROM label ORDER BY label.name, label.id", LABEL_COLUMNS),
                params![],
            )
        })
    }

    /// All labels ordered by name, with the number of bookmarks attached to each
    pub fn all_with_counts(&self) -> StoreResult<Vec<(Label, i64)>> {
        self.db.read(|conn| {
            let mut stmt = conn.prepare(&format!(
                r#"
                SELECT {}, COUNT(bookmark_to_label.bookmark_id) AS count
                FROM label
                LEFT JOIN bookmark_to_label ON label.id = bookmark_to_label.label_id
                GROUP BY label.id
                ORDER BY label.name, label.id
                "#,
                LABEL_COLUMNS
            ))?;
            let labels = stmt
                .query_map([], |row| Ok((row_to_label(row)?, row.get(3)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(labels)
        })
    }

    /// The first label carrying `style`, if any
    pub fn find_by_style(&self, style: BookmarkStyle) -> StoreResult<Option<Label>> {
        self.db.read(|conn| find_by_style(conn, style))
    }

    /// The label for a reserved style, created with an empty name if missing
    ///
    /// Lookup and creation run in one write transaction under the database
    /// lock, so concurrent callers always get the same label.
    pub fn get_or_create_reserved(&self, style: BookmarkStyle) -> StoreResult<Label> {
        if !style.is_reserved() {
            return Err(StoreError::constraint(format!(
                "style {} is not a reserved style",
                style
            )));
        }

        self.db.write(|tx| {
            if let Some(existing) = find_by_style(tx, style)? {
                return Ok(existing);
            }

            let new = NewLabel::new("").with_style(style);
            let id = insert_label(tx, &new)?;
            debug!("Created reserved {} label {}", style, id);
            Ok(new.into_label(id))
        })
    }
}

// ==================== Connection helpers ====================

fn insert_label(conn: &Connection, label: &NewLabel) -> StoreResult<LabelId> {
    conn.execute(
        "INSERT INTO label (name, bookmark_style) VALUES (?, ?)",
        params![label.name, label.bookmark_style],
    )?;
    let id = LabelId(conn.last_insert_rowid());
    debug!("Inserted label {} ({:?})", id, label.name);
    Ok(id)
}

fn find_by_style(conn: &Connection, style: BookmarkStyle) -> StoreResult<Option<Label>> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM label WHERE label.bookmark_style = ? ORDER BY label.id LIMIT 1",
                LABEL_COLUMNS
            ),
            params![style],
            row_to_label,
        )
        .optional()?)
}

pub(crate) fn label_exists(conn: &Connection, id: LabelId) -> StoreResult<bool> {
    Ok(conn
        .prepare_cached("SELECT 1 FROM label WHERE id = ?")?
        .exists(params![id])?)
}

pub(crate) fn query_labels(
    conn: &Connection,
    sql: &str,
    params: impl Params,
) -> StoreResult<Vec<Label>> {
    let mut stmt = conn.prepare(sql)?;
    let labels = stmt
        .query_map(params, row_to_label)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(labels)
}

pub(crate) fn row_to_label(row: &Row) -> rusqlite::Result<Label> {
    Ok(Label {
        id: row.get(0)?,
        name: row.get(1)?,
        bookmark_style: row.get(2)?,
    })
}

fn reserved_taken(style: BookmarkStyle) -> StoreError {
    StoreError::constraint(format!("a label with reserved style {} already exists", style))
}
