//! Saved page data access object

use super::database::{lock, DatabaseError};
use super::models::{NewSavedPage, SavedPage};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const SAVED_PAGE_COLUMNS: &str = "id, url, file_name, title, timestamp, file_path, profile_id";

/// Data access object for SavedPage operations
#[derive(Clone)]
pub struct SavedPageStore {
    conn: Arc<Mutex<Connection>>,
}

impl SavedPageStore {
    /// Create a new SavedPageStore
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Insert a saved page and return it with its assigned id
    pub fn insert(&self, page: NewSavedPage) -> Result<SavedPage, DatabaseError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO saved_pages (url, file_name, timestamp, title, file_path, profile_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                page.url,
                page.file_name,
                page.timestamp,
                page.title,
                page.file_path,
                page.profile_id,
            ],
        )?;
        Ok(page.into_saved(conn.last_insert_rowid()))
    }

    /// Get a saved page by ID
    pub fn get_by_id(&self, id: i64) -> Result<Option<SavedPage>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let page = conn
            .query_row(
                &format!("SELECT {SAVED_PAGE_COLUMNS} FROM saved_pages WHERE id = ?1"),
                params![id],
                Self::row_to_page,
            )
            .optional()?;
        Ok(page)
    }

    /// Get the first saved page stored under a literal `file://` path
    pub fn get_by_file_path(&self, file_path: &str) -> Result<Option<SavedPage>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let page = conn
            .query_row(
                &format!(
                    "SELECT {SAVED_PAGE_COLUMNS} FROM saved_pages WHERE file_path = ?1 ORDER BY id LIMIT 1"
                ),
                params![file_path],
                Self::row_to_page,
            )
            .optional()?;
        Ok(page)
    }

    /// Get all saved pages ordered by id
    pub fn get_all(&self) -> Result<Vec<SavedPage>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare(&format!("SELECT {SAVED_PAGE_COLUMNS} FROM saved_pages ORDER BY id"))?;
        let pages = stmt
            .query_map([], Self::row_to_page)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(pages)
    }

    /// Saved pages owned by a profile: those tagged with its id and those whose
    /// url matches one of its tabs.
    pub fn get_for_profile(&self, profile_id: &str) -> Result<Vec<SavedPage>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {SAVED_PAGE_COLUMNS} FROM saved_pages
             WHERE profile_id = ?1
                OR url IN (SELECT url FROM tabs WHERE profile_id = ?1)
             ORDER BY id"
        ))?;
        let pages = stmt
            .query_map(params![profile_id], Self::row_to_page)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(pages)
    }

    /// Delete a saved page. Returns whether a row was removed.
    pub fn delete(&self, id: i64) -> Result<bool, DatabaseError> {
        let conn = lock(&self.conn)?;
        let deleted = conn.execute("DELETE FROM saved_pages WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn row_to_page(row: &rusqlite::Row) -> SqliteResult<SavedPage> {
        Ok(SavedPage {
            id: row.get(0)?,
            url: row.get(1)?,
            file_name: row.get(2)?,
            title: row.get(3)?,
            timestamp: row.get(4)?,
            file_path: row.get(5)?,
            profile_id: row.get(6)?,
        })
    }
}
