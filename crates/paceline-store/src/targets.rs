//! Target lists and targets.

use chrono::{DateTime, FixedOffset};
use rusqlite::params;

use paceline_core::error::Result;
use paceline_core::types::ActionKind;

use crate::records::{parse_ts, parse_ts_opt, Target, TargetList};
use crate::{db_err, Store};

impl Store {
    pub fn create_list(
        &self,
        name: &str,
        description: &str,
        created_at: DateTime<FixedOffset>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO target_lists (name, description, created_at) VALUES (?1, ?2, ?3)",
            params![name, description, created_at.to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_list(&self, id: i64) -> Result<Option<TargetList>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id, name, description, created_at FROM target_lists WHERE id = ?1")
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map([id], |row| {
                let created_at: String = row.get(3)?;
                Ok(TargetList {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    created_at: parse_ts(&created_at),
                })
            })
            .map_err(db_err)?;
        match rows.next() {
            Some(row) => Ok(Some(row.map_err(db_err)?)),
            None => Ok(None),
        }
    }

    /// Add a target to a list. Duplicate URLs within a list are ignored.
    pub fn add_target(
        &self,
        list_id: i64,
        name: &str,
        url: &str,
        created_at: DateTime<FixedOffset>,
    ) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO targets (list_id, name, url, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![list_id, name, url, created_at.to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn list_targets(&self, list_id: i64) -> Result<Vec<Target>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, list_id, name, url, is_liked, is_commented, is_connected, last_action_at
                 FROM targets WHERE list_id = ?1 ORDER BY id",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([list_id], |row| {
                Ok(Target {
                    id: row.get(0)?,
                    list_id: row.get(1)?,
                    name: row.get(2)?,
                    url: row.get(3)?,
                    is_liked: row.get::<_, i64>(4)? != 0,
                    is_commented: row.get::<_, i64>(5)? != 0,
                    is_connected: row.get::<_, i64>(6)? != 0,
                    last_action_at: parse_ts_opt(row.get(7)?),
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    pub fn count_targets(&self, list_id: i64) -> Result<u32> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*) FROM targets WHERE list_id = ?1",
            [list_id],
            |row| row.get::<_, u32>(0),
        )
        .map_err(db_err)
    }

    /// Record a successful action against a target: bump the per-kind flag
    /// and the last-action timestamp.
    pub fn touch_target(
        &self,
        target_id: i64,
        kind: ActionKind,
        at: DateTime<FixedOffset>,
    ) -> Result<()> {
        let flag_col = match kind {
            ActionKind::Like => "is_liked",
            ActionKind::Comment => "is_commented",
            ActionKind::Connect => "is_connected",
        };
        let conn = self.conn()?;
        conn.execute(
            &format!("UPDATE targets SET {flag_col} = 1, last_action_at = ?1 WHERE id = ?2"),
            params![at.to_rfc3339(), target_id],
        )
        .map_err(db_err)?;
        Ok(())
    }
}
