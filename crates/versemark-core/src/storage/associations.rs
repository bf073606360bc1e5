//! Bookmark-label associations
//!
//! A pair links one bookmark to one label. Both ends must exist when the
//! pair is created and a pair can be stored only once.

use rusqlite::{params, Connection};
use tracing::debug;

use super::bookmarks::{bookmark_exists, BookmarkStore};
use super::database::Database;
use super::error::{StoreError, StoreResult};
use super::labels::{label_exists, query_labels};
use crate::models::{AssociationId, Bookmark, BookmarkId, BookmarkSortOrder, BookmarkToLabel, Label, LabelId};

/// Association queries and mutations
pub struct AssociationStore<'a> {
    db: &'a Database,
}

impl<'a> AssociationStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Attach a label to a bookmark
    pub fn insert(&self, bookmark_id: BookmarkId, label_id: LabelId) -> StoreResult<AssociationId> {
        self.db
            .write(|tx| insert_pair(tx, &BookmarkToLabel::new(bookmark_id, label_id)))
    }

    /// Attach several pairs at once
    ///
    /// Either every pair is stored or none is.
    pub fn insert_batch(&self, pairs: &[BookmarkToLabel]) -> StoreResult<Vec<AssociationId>> {
        self.db.write(|tx| {
            pairs
                .iter()
                .map(|pair| insert_pair(tx, pair))
                .collect::<StoreResult<Vec<_>>>()
        })
    }

    /// Detach a label from a bookmark, returning how many pairs were removed
    pub fn delete(&self, bookmark_id: BookmarkId, label_id: LabelId) -> StoreResult<usize> {
        self.db
            .write(|tx| delete_pair(tx, &BookmarkToLabel::new(bookmark_id, label_id)))
    }

    /// Detach several pairs at once; absent pairs are ignored
    pub fn delete_batch(&self, pairs: &[BookmarkToLabel]) -> StoreResult<usize> {
        self.db.write(|tx| {
            let mut removed = 0;
            for pair in pairs {
                removed += delete_pair(tx, pair)?;
            }
            Ok(removed)
        })
    }

    /// Replace the full label set of a bookmark
    pub fn set_labels(&self, bookmark_id: BookmarkId, label_ids: &[LabelId]) -> StoreResult<Vec<Label>> {
        let mut label_ids = label_ids.to_vec();
        label_ids.sort();
        label_ids.dedup();

        self.db.write(|tx| {
            if !bookmark_exists(tx, bookmark_id)? {
                return Err(StoreError::not_found("Bookmark", bookmark_id.0));
            }
            delete_for_bookmark(tx, bookmark_id)?;
            for label_id in &label_ids {
                insert_pair(tx, &BookmarkToLabel::new(bookmark_id, *label_id))?;
            }
            labels_for(tx, bookmark_id)
        })
    }

    /// Labels attached to a bookmark, ordered by name
    pub fn labels_for(&self, bookmark_id: BookmarkId) -> StoreResult<Vec<Label>> {
        self.db.read(|conn| labels_for(conn, bookmark_id))
    }

    /// Bookmarks carrying a label
    pub fn bookmarks_for(&self, label_id: LabelId, order: BookmarkSortOrder) -> StoreResult<Vec<Bookmark>> {
        BookmarkStore::new(self.db).with_label(label_id, order)
    }

    pub fn count_for_label(&self, label_id: LabelId) -> StoreResult<i64> {
        self.db.read(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM bookmark_to_label WHERE label_id = ?",
                params![label_id],
                |row| row.get(0),
            )?)
        })
    }
}

// ==================== Connection helpers ====================

pub(crate) fn insert_pair(conn: &Connection, pair: &BookmarkToLabel) -> StoreResult<AssociationId> {
    if !bookmark_exists(conn, pair.bookmark_id)? {
        return Err(StoreError::constraint(format!(
            "bookmark {} does not exist",
            pair.bookmark_id
        )));
    }
    if !label_exists(conn, pair.label_id)? {
        return Err(StoreError::constraint(format!(
            "label {} does not exist",
            pair.label_id
        )));
    }

    let duplicate = conn
        .prepare_cached("SELECT 1 FROM bookmark_to_label WHERE bookmark_id = ? AND label_id = ?")?
        .exists(params![pair.bookmark_id, pair.label_id])?;
    if duplicate {
        return Err(StoreError::constraint(format!(
            "bookmark {} already has label {}",
            pair.bookmark_id, pair.label_id
        )));
    }

    conn.execute(
        "INSERT INTO bookmark_to_label (bookmark_id, label_id) VALUES (?, ?)",
        params![pair.bookmark_id, pair.label_id],
    )?;
    debug!("Attached label {} to bookmark {}", pair.label_id, pair.bookmark_id);
    Ok(AssociationId(conn.last_insert_rowid()))
}

fn delete_pair(conn: &Connection, pair: &BookmarkToLabel) -> StoreResult<usize> {
    let removed = conn.execute(
        "DELETE FROM bookmark_to_label WHERE bookmark_id = ? AND label_id = ?",
        params![pair.bookmark_id, pair.label_id],
    )?;
    if removed > 0 {
        debug!("Detached label {} from bookmark {}", pair.label_id, pair.bookmark_id);
    }
    Ok(removed)
}

pub(crate) fn delete_for_bookmark(conn: &Connection, bookmark_id: BookmarkId) -> StoreResult<usize> {
    Ok(conn.execute(
        "DELETE FROM bookmark_to_label WHERE bookmark_id = ?",
        params![bookmark_id],
    )?)
}

pub(crate) fn delete_for_label(conn: &Connection, label_id: LabelId) -> StoreResult<usize> {
    Ok(conn.execute(
        "DELETE FROM bookmark_to_label WHERE label_id = ?",
        params![label_id],
    )?)
}

fn labels_for(conn: &Connection, bookmark_id: BookmarkId) -> StoreResult<Vec<Label>> {
    query_labels(
        conn,
        r#"
        SELECT label.id, label.name, label.bookmark_style
        FROM label
        JOIN bookmark_to_label ON label.id = bookmark_to_label.label_id
        WHERE bookmark_to_label.bookmark_id = ?
        ORDER BY label.name, label.id
        "#,
        params![bookmark_id],
    )
}
