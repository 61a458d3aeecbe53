//! Sender CRUD.

use chrono::{DateTime, FixedOffset};
use rusqlite::params;

use paceline_core::error::Result;
use paceline_core::types::{ActionKind, SenderStatus};

use crate::records::{parse_ts, Sender};
use crate::{db_err, Store};

fn sender_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Sender> {
    let status: String = row.get(3)?;
    let created_at: String = row.get(10)?;
    Ok(Sender {
        id: row.get(0)?,
        name: row.get(1)?,
        account_ref: row.get(2)?,
        status: status.parse().unwrap_or(SenderStatus::Disabled),
        daily_like_limit: row.get(4)?,
        weekly_like_limit: row.get(5)?,
        daily_comment_limit: row.get(6)?,
        weekly_comment_limit: row.get(7)?,
        daily_connect_limit: row.get(8)?,
        weekly_connect_limit: row.get(9)?,
        created_at: parse_ts(&created_at),
    })
}

const SENDER_COLS: &str = "id, name, account_ref, status, \
     daily_like_limit, weekly_like_limit, daily_comment_limit, \
     weekly_comment_limit, daily_connect_limit, weekly_connect_limit, created_at";

impl Store {
    /// Register a new sender. Caps start unset (inherit defaults).
    pub fn add_sender(
        &self,
        name: &str,
        account_ref: &str,
        created_at: DateTime<FixedOffset>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO senders (name, account_ref, created_at) VALUES (?1, ?2, ?3)",
            params![name, account_ref, created_at.to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_sender(&self, id: i64) -> Result<Option<Sender>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {SENDER_COLS} FROM senders WHERE id = ?1"))
            .map_err(db_err)?;
        let mut rows = stmt.query_map([id], sender_from_row).map_err(db_err)?;
        match rows.next() {
            Some(row) => Ok(Some(row.map_err(db_err)?)),
            None => Ok(None),
        }
    }

    pub fn list_senders(&self) -> Result<Vec<Sender>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {SENDER_COLS} FROM senders ORDER BY id"))
            .map_err(db_err)?;
        let rows = stmt.query_map([], sender_from_row).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    pub fn set_sender_status(&self, id: i64, status: SenderStatus) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE senders SET status = ?1 WHERE id = ?2",
            params![status.as_str(), id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// Set (or clear) a sender's cap overrides for one action kind.
    pub fn update_sender_limits(
        &self,
        id: i64,
        kind: ActionKind,
        daily: Option<u32>,
        weekly: Option<u32>,
    ) -> Result<()> {
        let (daily_col, weekly_col) = match kind {
            ActionKind::Like => ("daily_like_limit", "weekly_like_limit"),
            ActionKind::Comment => ("daily_comment_limit", "weekly_comment_limit"),
            ActionKind::Connect => ("daily_connect_limit", "weekly_connect_limit"),
        };
        let conn = self.conn()?;
        conn.execute(
            &format!("UPDATE senders SET {daily_col} = ?1, {weekly_col} = ?2 WHERE id = ?3"),
            params![daily, weekly, id],
        )
        .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_add_and_get_sender() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .add_sender("Asha", "asha@example.com", Utc::now().fixed_offset())
            .unwrap();
        let sender = store.get_sender(id).unwrap().unwrap();
        assert_eq!(sender.name, "Asha");
        assert_eq!(sender.status, SenderStatus::Active);
        assert_eq!(sender.daily_cap(ActionKind::Like), None);
    }

    #[test]
    fn test_status_and_limit_updates() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .add_sender("Ben", "ben@example.com", Utc::now().fixed_offset())
            .unwrap();
        store.set_sender_status(id, SenderStatus::Paused).unwrap();
        store
            .update_sender_limits(id, ActionKind::Comment, Some(10), Some(40))
            .unwrap();

        let sender = store.get_sender(id).unwrap().unwrap();
        assert_eq!(sender.status, SenderStatus::Paused);
        assert_eq!(sender.daily_cap(ActionKind::Comment), Some(10));
        assert_eq!(sender.weekly_cap(ActionKind::Comment), Some(40));
        assert_eq!(sender.daily_cap(ActionKind::Connect), None);
    }

    #[test]
    fn test_duplicate_account_ref_rejected() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now().fixed_offset();
        store.add_sender("A", "same@example.com", now).unwrap();
        assert!(store.add_sender("B", "same@example.com", now).is_err());
    }
}
