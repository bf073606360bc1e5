//! Bookmark store
//!
//! CRUD plus range and point queries over bookmarks. Every query runs in
//! canonical-ordinal space; overlap is plain inclusive interval
//! intersection: a bookmark `[s, e]` matches `[start, end]` iff
//! `s <= end AND e >= start`.

use chrono::DateTime;
use rusqlite::types::{FromSqlError, Type};
use rusqlite::{params, params_from_iter, Connection, Params, Row};
use tracing::debug;

use super::associations::delete_for_bookmark;
use super::database::Database;
use super::error::{StoreError, StoreResult};
use crate::models::{now, Bookmark, BookmarkId, BookmarkSortOrder, LabelId, NewBookmark};
use crate::versification::Ordinal;

pub(crate) const BOOKMARK_COLUMNS: &str = "bookmark.id, bookmark.kjv_ordinal_start, \
     bookmark.kjv_ordinal_end, bookmark.ordinal_start, bookmark.ordinal_end, \
     bookmark.versification, bookmark.notes, bookmark.created_at";

/// Bookmark queries and mutations
pub struct BookmarkStore<'a> {
    db: &'a Database,
}

impl<'a> BookmarkStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    // ==================== Mutations ====================

    /// Insert a bookmark, returning its new id
    pub fn insert(&self, bookmark: &NewBookmark) -> StoreResult<BookmarkId> {
        self.db.write(|tx| insert_bookmark(tx, bookmark))
    }

    /// Replace a stored bookmark by id
    pub fn update(&self, bookmark: &Bookmark) -> StoreResult<()> {
        check_range(bookmark.kjv_ordinal_start, bookmark.kjv_ordinal_end)?;

        self.db.write(|tx| {
            let changed = tx.execute(
                r#"
                UPDATE bookmark SET
                    kjv_ordinal_start = ?2, kjv_ordinal_end = ?3,
                    ordinal_start = ?4, ordinal_end = ?5,
                    versification = ?6, notes = ?7, created_at = ?8
                WHERE id = ?1
                "#,
                params![
                    bookmark.id,
                    bookmark.kjv_ordinal_start,
                    bookmark.kjv_ordinal_end,
                    bookmark.ordinal_start,
                    bookmark.ordinal_end,
                    bookmark.versification,
                    bookmark.notes,
                    bookmark.created_at.timestamp_millis(),
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::not_found("Bookmark", bookmark.id.0));
            }
            debug!("Updated bookmark {}", bookmark.id);
            Ok(())
        })
    }

    /// Stamp `created_at` with the current time, persist, and return the result
    pub fn touch(&self, bookmark: &Bookmark) -> StoreResult<Bookmark> {
        let touched = Bookmark {
            created_at: now(),
            ..bookmark.clone()
        };
        self.update(&touched)?;
        Ok(touched)
    }

    /// Delete a bookmark together with all of its label associations
    pub fn delete(&self, id: BookmarkId) -> StoreResult<()> {
        self.db.write(|tx| {
            let unlinked = delete_for_bookmark(tx, id)?;
            let deleted = tx.execute("DELETE FROM bookmark WHERE id = ?", params![id])?;
            if deleted == 0 {
                return Err(StoreError::not_found("Bookmark", id.0));
            }
            debug!("Deleted bookmark {} ({} association(s))", id, unlinked);
            Ok(())
        })
    }

    // ==================== Lookups ====================

    /// Get a bookmark by id
    pub fn by_id(&self, id: BookmarkId) -> StoreResult<Option<Bookmark>> {
        self.db.read(|conn| {
            let mut found = query_bookmarks(
                conn,
                &format!("SELECT {} FROM bookmark WHERE bookmark.id = ?", BOOKMARK_COLUMNS),
                params![id],
            )?;
            Ok(found.pop())
        })
    }

    /// Get the bookmarks among `ids` that exist, ordered by id
    ///
    /// Duplicate ids collapse; missing ids are skipped.
    pub fn by_ids(&self, ids: &[BookmarkId]) -> StoreResult<Vec<Bookmark>> {
        let mut ids = ids.to_vec();
        ids.sort();
        ids.dedup();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "SELECT {} FROM bookmark WHERE bookmark.id IN ({}) ORDER BY bookmark.id",
            BOOKMARK_COLUMNS, placeholders
        );
        self.db
            .read(|conn| query_bookmarks(conn, &sql, params_from_iter(ids.iter())))
    }

    /// All bookmarks in the given order
    pub fn all(&self, order: BookmarkSortOrder) -> StoreResult<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {} FROM bookmark ORDER BY {}",
            BOOKMARK_COLUMNS,
            order.order_clause()
        );
        self.db.read(|conn| query_bookmarks(conn, &sql, []))
    }

    pub fn count(&self) -> StoreResult<i64> {
        self.db.read(|conn| {
            Ok(conn.query_row("SELECT COUNT(*) FROM bookmark", [], |row| row.get(0))?)
        })
    }

    // ==================== Range queries ====================

    /// Bookmarks whose range overlaps `[start, end]`, shared boundaries included
    pub fn for_range(&self, start: Ordinal, end: Ordinal) -> StoreResult<Vec<Bookmark>> {
        check_range(start, end)?;
        let sql = format!(
            "SELECT {} FROM bookmark \
             WHERE bookmark.kjv_ordinal_start <= ?2 AND bookmark.kjv_ordinal_end >= ?1 \
             ORDER BY {}",
            BOOKMARK_COLUMNS,
            BookmarkSortOrder::BibleOrder.order_clause()
        );
        self.db
            .read(|conn| query_bookmarks(conn, &sql, params![start, end]))
    }

    /// Bookmarks whose range contains `ordinal`
    pub fn for_point(&self, ordinal: Ordinal) -> StoreResult<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {} FROM bookmark \
             WHERE bookmark.kjv_ordinal_start <= ?1 AND ?1 <= bookmark.kjv_ordinal_end \
             ORDER BY {}",
            BOOKMARK_COLUMNS,
            BookmarkSortOrder::BibleOrder.order_clause()
        );
        self.db
            .read(|conn| query_bookmarks(conn, &sql, params![ordinal]))
    }

    /// Bookmarks whose range starts exactly at `ordinal`
    pub fn for_exact_start(&self, ordinal: Ordinal) -> StoreResult<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {} FROM bookmark WHERE bookmark.kjv_ordinal_start = ?1 ORDER BY {}",
            BOOKMARK_COLUMNS,
            BookmarkSortOrder::BibleOrder.order_clause()
        );
        self.db
            .read(|conn| query_bookmarks(conn, &sql, params![ordinal]))
    }

    /// Whether any bookmark contains `ordinal`
    pub fn has_any(&self, ordinal: Ordinal) -> StoreResult<bool> {
        self.db.read(|conn| {
            Ok(conn.query_row(
                "SELECT EXISTS (SELECT 1 FROM bookmark \
                 WHERE kjv_ordinal_start <= ?1 AND ?1 <= kjv_ordinal_end)",
                params![ordinal],
                |row| row.get(0),
            )?)
        })
    }

    // ==================== Label joins ====================

    /// Bookmarks without any label
    pub fn unlabelled(&self, order: BookmarkSortOrder) -> StoreResult<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {} FROM bookmark WHERE NOT EXISTS \
             (SELECT 1 FROM bookmark_to_label WHERE bookmark_to_label.bookmark_id = bookmark.id) \
             ORDER BY {}",
            BOOKMARK_COLUMNS,
            order.order_clause()
        );
        self.db.read(|conn| query_bookmarks(conn, &sql, []))
    }

    /// Bookmarks carrying a label
    pub fn with_label(
        &self,
        label_id: LabelId,
        order: BookmarkSortOrder,
    ) -> StoreResult<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {} FROM bookmark \
             JOIN bookmark_to_label ON bookmark.id = bookmark_to_label.bookmark_id \
             WHERE bookmark_to_label.label_id = ?1 \
             ORDER BY {}",
            BOOKMARK_COLUMNS,
            order.order_clause()
        );
        self.db
            .read(|conn| query_bookmarks(conn, &sql, params![label_id]))
    }

    /// Bookmarks carrying a label and starting exactly at `ordinal`
    ///
    /// Used to detect duplicate bookmarks at the same anchor under the same label.
    pub fn with_label_at_exact_start(
        &self,
        label_id: LabelId,
        ordinal: Ordinal,
    ) -> StoreResult<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {} FROM bookmark \
             JOIN bookmark_to_label ON bookmark.id = bookmark_to_label.bookmark_id \
             WHERE bookmark_to_label.label_id = ?1 AND bookmark.kjv_ordinal_start = ?2 \
             ORDER BY {}",
            BOOKMARK_COLUMNS,
            BookmarkSortOrder::BibleOrder.order_clause()
        );
        self.db
            .read(|conn| query_bookmarks(conn, &sql, params![label_id, ordinal]))
    }
}

// ==================== Connection helpers ====================

/// Insert a bookmark on an open connection or transaction
pub(crate) fn insert_bookmark(conn: &Connection, bookmark: &NewBookmark) -> StoreResult<BookmarkId> {
    check_range(bookmark.kjv_ordinal_start, bookmark.kjv_ordinal_end)?;

    conn.execute(
        r#"
        INSERT INTO bookmark (kjv_ordinal_start, kjv_ordinal_end, ordinal_start, ordinal_end,
                              versification, notes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        params![
            bookmark.kjv_ordinal_start,
            bookmark.kjv_ordinal_end,
            bookmark.ordinal_start,
            bookmark.ordinal_end,
            bookmark.versification,
            bookmark.notes,
            bookmark.created_at.timestamp_millis(),
        ],
    )?;

    let id = BookmarkId(conn.last_insert_rowid());
    debug!(
        "Inserted bookmark {} [{}, {}]",
        id, bookmark.kjv_ordinal_start, bookmark.kjv_ordinal_end
    );
    Ok(id)
}

pub(crate) fn bookmark_exists(conn: &Connection, id: BookmarkId) -> StoreResult<bool> {
    Ok(conn
        .prepare_cached("SELECT 1 FROM bookmark WHERE id = ?")?
        .exists(params![id])?)
}

fn query_bookmarks(conn: &Connection, sql: &str, params: impl Params) -> StoreResult<Vec<Bookmark>> {
    let mut stmt = conn.prepare(sql)?;
    let bookmarks = stmt
        .query_map(params, row_to_bookmark)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(bookmarks)
}

fn row_to_bookmark(row: &Row) -> rusqlite::Result<Bookmark> {
    let created_at: i64 = row.get(7)?;
    Ok(Bookmark {
        id: row.get(0)?,
        kjv_ordinal_start: row.get(1)?,
        kjv_ordinal_end: row.get(2)?,
        ordinal_start: row.get(3)?,
        ordinal_end: row.get(4)?,
        versification: row.get(5)?,
        notes: row.get(6)?,
        created_at: DateTime::from_timestamp_millis(created_at).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                7,
                Type::Integer,
                Box::new(FromSqlError::OutOfRange(created_at)),
            )
        })?,
    })
}

fn check_range(start: Ordinal, end: Ordinal) -> StoreResult<()> {
    if start > end {
        return Err(StoreError::constraint(format!(
            "range start {} is after range end {}",
            start, end
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BookmarkToLabel, NewLabel};
    use crate::storage::{AssociationStore, LabelStore};

    fn insert(store: &BookmarkStore, start: Ordinal, end: Ordinal) -> BookmarkId {
        store.insert(&NewBookmark::new("KJVA", start, end)).unwrap()
    }

    fn ids(bookmarks: &[Bookmark]) -> Vec<BookmarkId> {
        bookmarks.iter().map(|b| b.id).collect()
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let new = NewBookmark::new("Shifted", 10, 12)
            .with_source_ordinals(11, 13)
            .with_notes(Some("Beatitudes".to_string()));
        let id = store.insert(&new).unwrap();

        let found = store.by_id(id).unwrap().unwrap();
        assert_eq!(found, new.into_bookmark(id));
    }

    #[test]
    fn test_corrupt_timestamp_is_a_storage_error() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);
        let id = insert(&store, 1, 1);

        db.write(|tx| {
            tx.execute(
                "UPDATE bookmark SET created_at = ?1 WHERE id = ?2",
                params![i64::MAX, id],
            )?;
            Ok(())
        })
        .unwrap();

        assert!(matches!(store.by_id(id), Err(StoreError::Storage(_))));
    }

    #[test]
    fn test_insert_rejects_inverted_range() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let err = store.insert(&NewBookmark::new("KJVA", 5, 4)).unwrap_err();
        assert!(err.is_constraint());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_ids_are_unique() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let a = insert(&store, 1, 1);
        let b = insert(&store, 1, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn test_update_and_not_found() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let id = insert(&store, 1, 2);
        let mut bookmark = store.by_id(id).unwrap().unwrap();
        bookmark.notes = Some("edited".to_string());
        bookmark.kjv_ordinal_end = 5;
        store.update(&bookmark).unwrap();
        assert_eq!(store.by_id(id).unwrap().unwrap(), bookmark);

        let missing = Bookmark {
            id: BookmarkId(9999),
            ..bookmark.clone()
        };
        assert!(store.update(&missing).unwrap_err().is_not_found());

        let inverted = Bookmark {
            kjv_ordinal_start: 10,
            ..bookmark
        };
        assert!(store.update(&inverted).unwrap_err().is_constraint());
    }

    #[test]
    fn test_touch_bumps_created_at() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let mut new = NewBookmark::new("KJVA", 3, 4);
        new.created_at = DateTime::from_timestamp_millis(1_000).unwrap();
        let id = store.insert(&new).unwrap();
        let original = store.by_id(id).unwrap().unwrap();

        let touched = store.touch(&original).unwrap();
        assert!(touched.created_at > original.created_at);
        assert_eq!(touched.kjv_ordinal_start, original.kjv_ordinal_start);
        assert_eq!(store.by_id(id).unwrap().unwrap(), touched);
    }

    #[test]
    fn test_delete() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let id = insert(&store, 100, 120);
        store.delete(id).unwrap();

        assert!(store.by_id(id).unwrap().is_none());
        assert!(store.for_point(110).unwrap().is_empty());
        assert!(store.for_range(0, 1000).unwrap().is_empty());
        assert!(store.delete(id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_by_ids_collapses_duplicates_and_skips_missing() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let a = insert(&store, 1, 1);
        let b = insert(&store, 2, 2);

        let found = store.by_ids(&[b, a, b, BookmarkId(404)]).unwrap();
        assert_eq!(ids(&found), vec![a, b]);
        assert!(store.by_ids(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_range_example_shared_boundary() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let a = insert(&store, 100, 120);
        let b = insert(&store, 120, 150);

        assert_eq!(ids(&store.for_range(110, 119).unwrap()), vec![a]);
        assert_eq!(ids(&store.for_range(120, 120).unwrap()), vec![a, b]);
        assert_eq!(ids(&store.for_range(151, 200).unwrap()), Vec::<BookmarkId>::new());
        assert!(store.for_range(10, 9).unwrap_err().is_constraint());
    }

    #[test]
    fn test_range_matches_overlap_law_exhaustively() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        const MAX: Ordinal = 8;
        let mut stored = Vec::new();
        for s in 0..=MAX {
            for e in s..=MAX {
                stored.push((insert(&store, s, e), s, e));
            }
        }

        for qs in 0..=MAX + 1 {
            for qe in qs..=MAX + 1 {
                let mut expected: Vec<BookmarkId> = stored
                    .iter()
                    .filter(|(_, s, e)| *s <= qe && *e >= qs)
                    .map(|(id, _, _)| *id)
                    .collect();
                let mut actual = ids(&store.for_range(qs, qe).unwrap());
                expected.sort();
                actual.sort();
                assert_eq!(actual, expected, "query [{}, {}]", qs, qe);
            }
        }
    }

    #[test]
    fn test_point_and_has_any_agree() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        insert(&store, 2, 4);
        insert(&store, 4, 6);
        insert(&store, 9, 9);

        for x in 0..12 {
            let at = store.for_point(x).unwrap();
            assert!(at.iter().all(|b| b.contains(x)));
            assert_eq!(store.has_any(x).unwrap(), !at.is_empty(), "ordinal {}", x);
        }
        assert_eq!(store.for_point(4).unwrap().len(), 2);
        assert!(!store.has_any(7).unwrap());
    }

    #[test]
    fn test_exact_start() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let a = insert(&store, 5, 5);
        let b = insert(&store, 5, 9);
        insert(&store, 4, 9);

        assert_eq!(ids(&store.for_exact_start(5).unwrap()), vec![a, b]);
        assert!(store.for_exact_start(6).unwrap().is_empty());
    }

    #[test]
    fn test_sort_orders() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);

        let mut late = NewBookmark::new("KJVA", 1, 1);
        late.created_at = DateTime::from_timestamp_millis(3_000).unwrap();
        let mut early = NewBookmark::new("KJVA", 50, 50);
        early.created_at = DateTime::from_timestamp_millis(1_000).unwrap();
        let mut middle = NewBookmark::new("KJVA", 20, 30);
        middle.created_at = DateTime::from_timestamp_millis(2_000).unwrap();

        let late = store.insert(&late).unwrap();
        let early = store.insert(&early).unwrap();
        let middle = store.insert(&middle).unwrap();

        assert_eq!(
            ids(&store.all(BookmarkSortOrder::BibleOrder).unwrap()),
            vec![late, middle, early]
        );
        assert_eq!(
            ids(&store.all(BookmarkSortOrder::CreatedAt).unwrap()),
            vec![late, middle, early]
        );

        let mut newest = NewBookmark::new("KJVA", 40, 40);
        newest.created_at = DateTime::from_timestamp_millis(4_000).unwrap();
        let newest = store.insert(&newest).unwrap();
        assert_eq!(
            ids(&store.all(BookmarkSortOrder::CreatedAt).unwrap())[0],
            newest
        );
        assert_eq!(
            ids(&store.all(BookmarkSortOrder::BibleOrder).unwrap()),
            vec![late, middle, newest, early]
        );
    }

    #[test]
    fn test_label_joins_partition_all_bookmarks() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);
        let labels = LabelStore::new(&db);
        let associations = AssociationStore::new(&db);

        let red = labels.insert(&NewLabel::new("red")).unwrap();
        let blue = labels.insert(&NewLabel::new("blue")).unwrap();

        let a = insert(&store, 1, 3);
        let b = insert(&store, 3, 5);
        let c = insert(&store, 7, 8);
        let d = insert(&store, 9, 9);

        associations
            .insert_batch(&[
                BookmarkToLabel::new(a, red),
                BookmarkToLabel::new(b, red),
                BookmarkToLabel::new(b, blue),
                BookmarkToLabel::new(c, blue),
            ])
            .unwrap();

        let order = BookmarkSortOrder::BibleOrder;
        let unlabelled = ids(&store.unlabelled(order).unwrap());
        let with_red = ids(&store.with_label(red, order).unwrap());
        let with_blue = ids(&store.with_label(blue, order).unwrap());

        assert_eq!(unlabelled, vec![d]);
        assert_eq!(with_red, vec![a, b]);
        assert_eq!(with_blue, vec![b, c]);

        for id in &unlabelled {
            assert!(!with_red.contains(id) && !with_blue.contains(id));
        }

        let mut union: Vec<BookmarkId> = unlabelled
            .into_iter()
            .chain(with_red)
            .chain(with_blue)
            .collect();
        union.sort();
        union.dedup();
        let mut all = ids(&store.all(order).unwrap());
        all.sort();
        assert_eq!(union, all);
    }

    #[test]
    fn test_with_label_at_exact_start() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);
        let labels = LabelStore::new(&db);
        let associations = AssociationStore::new(&db);

        let label = labels.insert(&NewLabel::new("memorise")).unwrap();
        let other = labels.insert(&NewLabel::new("other")).unwrap();

        let a = insert(&store, 10, 12);
        let b = insert(&store, 10, 10);
        let c = insert(&store, 11, 12);

        associations.insert(a, label).unwrap();
        associations.insert(b, other).unwrap();
        associations.insert(c, label).unwrap();

        assert_eq!(ids(&store.with_label_at_exact_start(label, 10).unwrap()), vec![a]);
        assert_eq!(ids(&store.with_label_at_exact_start(other, 10).unwrap()), vec![b]);
        assert!(store.with_label_at_exact_start(other, 11).unwrap().is_empty());
    }

    #[test]
    fn test_delete_removes_associations() {
        let db = Database::open_in_memory().unwrap();
        let store = BookmarkStore::new(&db);
        let labels = LabelStore::new(&db);
        let associations = AssociationStore::new(&db);

        let label = labels.insert(&NewLabel::new("keep")).unwrap();
        let a = insert(&store, 1, 1);
        let b = insert(&store, 2, 2);
        associations.insert(a, label).unwrap();
        associations.insert(b, label).unwrap();

        store.delete(a).unwrap();

        assert_eq!(
            ids(&associations
                .bookmarks_for(label, BookmarkSortOrder::BibleOrder)
                .unwrap()),
            vec![b]
        );
        assert_eq!(associations.count_for_label(label).unwrap(), 1);
        assert!(associations.labels_for(a).unwrap().is_empty());
    }
}
