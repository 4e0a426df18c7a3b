//! Profile data access object

use super::database::{lock, DatabaseError};
use super::models::Profile;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

const PROFILE_COLUMNS: &str = "profile_id, profile_name, profile_dir, user_id, is_hidden";

/// Data access object for Profile operations
#[derive(Clone)]
pub struct ProfileStore {
    conn: Arc<Mutex<Connection>>,
}

impl ProfileStore {
    /// Create a new ProfileStore
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Insert a profile unless its id or directory is already taken.
    /// Returns whether a row was inserted.
    pub fn insert_or_ignore(&self, profile: &Profile) -> Result<bool, DatabaseError> {
        let conn = lock(&self.conn)?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO profiles (profile_id, profile_name, profile_dir, user_id, is_hidden)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                profile.profile_id,
                profile.name,
                profile.directory,
                profile.user_id,
                profile.hidden as i32,
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Record the name and user id the extension reports for a profile,
    /// creating the profile if it is not stored yet. The directory is left alone.
    pub fn upsert_reported(
        &self,
        profile_id: &str,
        name: &str,
        user_id: &str,
    ) -> Result<(), DatabaseError> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO profiles (profile_id, profile_name, profile_dir, user_id)
             VALUES (?1, ?2, NULL, ?3)
             ON CONFLICT(profile_id) DO UPDATE SET profile_name = ?2, user_id = ?3",
            params![profile_id, name, user_id],
        )?;
        Ok(())
    }

    /// Get a profile by ID
    pub fn get_by_id(&self, profile_id: &str) -> Result<Option<Profile>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let profile = conn
            .query_row(
                &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE profile_id = ?1"),
                params![profile_id],
                Self::row_to_profile,
            )
            .optional()?;
        Ok(profile)
    }

    /// Get the first profile whose directory matches case-insensitively
    pub fn get_by_directory(&self, directory: &str) -> Result<Option<Profile>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let profile = conn
            .query_row(
                &format!(
                    "SELECT {PROFILE_COLUMNS} FROM profiles WHERE lower(profile_dir) = lower(?1)
                     ORDER BY rowid LIMIT 1"
                ),
                params![directory],
                Self::row_to_profile,
            )
            .optional()?;
        Ok(profile)
    }

    /// Get all profiles in insertion order
    pub fn get_all(&self) -> Result<Vec<Profile>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare(&format!("SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY rowid"))?;
        let profiles = stmt
            .query_map([], Self::row_to_profile)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(profiles)
    }

    /// Browser directory of a profile. `None` when the profile is unknown or
    /// its directory has not been discovered yet.
    pub fn directory_for(&self, profile_id: &str) -> Result<Option<String>, DatabaseError> {
        let conn = lock(&self.conn)?;
        let dir: Option<Option<String>> = conn
            .query_row(
                "SELECT profile_dir FROM profiles WHERE profile_id = ?1",
                params![profile_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(dir.flatten())
    }

    /// Set the hidden flag. Returns false when the profile does not exist.
    pub fn set_hidden(&self, profile_id: &str, hidden: bool) -> Result<bool, DatabaseError> {
        let conn = lock(&self.conn)?;
        let updated = conn.execute(
            "UPDATE profiles SET is_hidden = ?2 WHERE profile_id = ?1",
            params![profile_id, hidden as i32],
        )?;
        Ok(updated > 0)
    }

    /// Delete a profile together with its tabs. Returns whether the profile existed.
    pub fn delete_with_tabs(&self, profile_id: &str) -> Result<bool, DatabaseError> {
        let mut conn = lock(&self.conn)?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM tabs WHERE profile_id = ?1", params![profile_id])?;
        let deleted = tx.execute(
            "DELETE FROM profiles WHERE profile_id = ?1",
            params![profile_id],
        )?;
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Convert a database row to a Profile
    fn row_to_profile(row: &rusqlite::Row) -> SqliteResult<Profile> {
        let hidden: i64 = row.get(4)?;
        Ok(Profile {
            profile_id: row.get(0)?,
            name: row.get(1)?,
            directory: row.get(2)?,
            user_id: row.get(3)?,
            hidden: hidden != 0,
        })
    }
}
