//! Tab data access object

use super::database::{lock, DatabaseError};
use super::models::Tab;
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// Data access object for Tab operations
#[derive(Clone)]
pub struct TabStore {
    conn: Arc<Mutex<Connection>>,
}

impl TabStore {
    /// Create a new TabStore
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Delete every tab of a profile, returning how many were removed
    pub fn delete_for_profile(&self, profile_id: &str) -> Result<usize, DatabaseError> {
        let conn = lock(&self.conn)?;
        let removed = conn.execute("DELETE FROM tabs WHERE profile_id = ?1", params![profile_id])?;
        Ok(removed)
    }

    /// Insert a tab unless (profile_id, tab_id) is already present.
    /// Returns whether a row was inserted.
    pub fn insert_or_ignore(&self, tab: &Tab) -> Result<bool, DatabaseError> {
        let conn = lock(&self.conn)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO tabs (profile_id, tab_id, title, url) VALUES (?1, ?2, ?3, ?4)",
            params![tab.profile_id, tab.tab_id, tab.title, tab.url],
        )?;
        Ok(inserted > 0)
    }

    /// Get the tabs of one profile ordered by insertion
    pub fn get_for_profile(&self, profile_id: &str) -> Result<Vec<Tab>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare(
            "SELECT profile_id, tab_id, title, url FROM tabs WHERE profile_id = ?1 ORDER BY id",
        )?;
        let tabs = stmt
            .query_map(params![profile_id], Self::row_to_tab)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(tabs)
    }

    /// Get all tabs ordered by insertion
    pub fn get_all(&self) -> Result<Vec<Tab>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let mut stmt = conn.prepare("SELECT profile_id, tab_id, title, url FROM tabs ORDER BY id")?;
        let tabs = stmt
            .query_map([], Self::row_to_tab)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(tabs)
    }

    fn row_to_tab(row: &rusqlite::Row) -> SqliteResult<Tab> {
        Ok(Tab {
            profile_id: row.get(0)?,
            tab_id: row.get(1)?,
            title: row.get(2)?,
            url: row.get(3)?,
        })
    }
}
