//! Campaign rows, status transitions, and aggregate counters.
//!
//! Status updates are guarded in SQL (`WHERE status IN (...)`) so a stale
//! caller can never push a terminal campaign back to life; the affected
//! row count tells the caller whether the transition happened.
//!
//! Counter bumps advance `processed` and exactly one outcome column in a
//! single UPDATE, which keeps `processed = successful + failed + skipped`
//! true after every transition.

use chrono::{DateTime, FixedOffset};
use rusqlite::params;

use paceline_core::error::Result;
use paceline_core::types::{ActionKind, CampaignStatus};

use crate::records::{parse_ts, parse_ts_opt, Campaign};
use crate::{db_err, Store};

const CAMPAIGN_COLS: &str = "id, name, list_id, sender_id, action_kind, status, note, \
     total, processed, successful, failed, skipped, created_at, started_at, completed_at";

fn campaign_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Campaign> {
    let kind: String = row.get(4)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(12)?;
    Ok(Campaign {
        id: row.get(0)?,
        name: row.get(1)?,
        list_id: row.get(2)?,
        sender_id: row.get(3)?,
        kind: kind.parse().unwrap_or(ActionKind::Like),
        status: status.parse().unwrap_or(CampaignStatus::Draft),
        note: row.get(6)?,
        total: row.get(7)?,
        processed: row.get(8)?,
        successful: row.get(9)?,
        failed: row.get(10)?,
        skipped: row.get(11)?,
        created_at: parse_ts(&created_at),
        started_at: parse_ts_opt(row.get(13)?),
        completed_at: parse_ts_opt(row.get(14)?),
    })
}

impl Store {
    /// Insert a new campaign in `draft`.
    #[allow(clippy::too_many_arguments)]
    pub fn create_campaign(
        &self,
        name: &str,
        list_id: i64,
        sender_id: i64,
        kind: ActionKind,
        note: Option<&str>,
        total: u32,
        created_at: DateTime<FixedOffset>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO campaigns (name, list_id, sender_id, action_kind, note, total, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![name, list_id, sender_id, kind.as_str(), note, total, created_at.to_rfc3339()],
        )
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_campaign(&self, id: i64) -> Result<Option<Campaign>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {CAMPAIGN_COLS} FROM campaigns WHERE id = ?1"))
            .map_err(db_err)?;
        let mut rows = stmt.query_map([id], campaign_from_row).map_err(db_err)?;
        match rows.next() {
            Some(row) => Ok(Some(row.map_err(db_err)?)),
            None => Ok(None),
        }
    }

    pub fn list_campaigns(&self) -> Result<Vec<Campaign>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!("SELECT {CAMPAIGN_COLS} FROM campaigns ORDER BY created_at DESC, id DESC"))
            .map_err(db_err)?;
        let rows = stmt.query_map([], campaign_from_row).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// IDs of campaigns in the given status, used by restart recovery.
    pub fn campaign_ids_with_status(&self, status: CampaignStatus) -> Result<Vec<i64>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT id FROM campaigns WHERE status = ?1 ORDER BY id")
            .map_err(db_err)?;
        let rows = stmt
            .query_map([status.as_str()], |row| row.get::<_, i64>(0))
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// `draft|paused|active → active`. Sets `started_at` on the first
    /// activation only. Returns false if the campaign was terminal.
    pub fn activate_campaign(&self, id: i64, started_at: DateTime<FixedOffset>) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn
            .execute(
                "UPDATE campaigns
                 SET status = 'active', started_at = COALESCE(started_at, ?1)
                 WHERE id = ?2 AND status IN ('draft', 'paused', 'active')",
                params![started_at.to_rfc3339(), id],
            )
            .map_err(db_err)?;
        Ok(n > 0)
    }

    /// `active → paused`. Also the landing state after a worker error.
    pub fn pause_campaign_row(&self, id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn
            .execute(
                "UPDATE campaigns SET status = 'paused' WHERE id = ?1 AND status = 'active'",
                [id],
            )
            .map_err(db_err)?;
        Ok(n > 0)
    }

    /// `draft|active|paused → cancelled` (terminal).
    pub fn cancel_campaign_row(&self, id: i64, at: DateTime<FixedOffset>) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn
            .execute(
                "UPDATE campaigns SET status = 'cancelled', completed_at = ?1
                 WHERE id = ?2 AND status IN ('draft', 'active', 'paused')",
                params![at.to_rfc3339(), id],
            )
            .map_err(db_err)?;
        Ok(n > 0)
    }

    /// `active → completed` (terminal), when the queue is exhausted.
    pub fn complete_campaign_row(&self, id: i64, at: DateTime<FixedOffset>) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn
            .execute(
                "UPDATE campaigns SET status = 'completed', completed_at = ?1
                 WHERE id = ?2 AND status = 'active'",
                params![at.to_rfc3339(), id],
            )
            .map_err(db_err)?;
        Ok(n > 0)
    }

    pub fn record_success(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE campaigns SET processed = processed + 1, successful = successful + 1
             WHERE id = ?1",
            [id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn record_failure(&self, id: i64) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE campaigns SET processed = processed + 1, failed = failed + 1 WHERE id = ?1",
            [id],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn record_skip(&self, id: i64) -> Result<()> {
        self.record_skips(id, 1)
    }

    /// Bulk skip accounting, used when cancellation skips the remainder.
    pub fn record_skips(&self, id: i64, n: u32) -> Result<()> {
        if n == 0 {
            return Ok(());
        }
        let conn = self.conn()?;
        conn.execute(
            "UPDATE campaigns SET processed = processed + ?1, skipped = skipped + ?1
             WHERE id = ?2",
            params![n, id],
        )
        .map_err(db_err)?;
        Ok(())
    }
}
