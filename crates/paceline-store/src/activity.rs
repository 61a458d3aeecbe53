//! Append-only activity log.

use chrono::{DateTime, FixedOffset};
use rusqlite::params;

use paceline_core::error::Result;

use crate::records::{parse_ts, ActivityRecord, NewActivity};
use crate::{db_err, Store};

impl Store {
    /// Append one audit row. Rows are never updated or deleted.
    pub fn log_activity(
        &self,
        activity: &NewActivity<'_>,
        at: DateTime<FixedOffset>,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO activity_log
                 (action_kind, sender_id, sender_name, target_name, target_url,
                  campaign_id, status, detail, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                activity.kind,
                activity.sender_id,
                activity.sender_name,
                activity.target_name,
                activity.target_url,
                activity.campaign_id,
                activity.status,
                activity.detail,
                at.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        Ok(conn.last_insert_rowid())
    }

    /// The most recent activity rows, newest first.
    pub fn recent_activity(&self, limit: usize) -> Result<Vec<ActivityRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, action_kind, sender_id, sender_name, target_name, target_url,
                        campaign_id, status, detail, created_at
                 FROM activity_log ORDER BY id DESC LIMIT ?1",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([limit as i64], |row| {
                let created_at: String = row.get(9)?;
                Ok(ActivityRecord {
                    id: row.get(0)?,
                    kind: row.get(1)?,
                    sender_id: row.get(2)?,
                    sender_name: row.get(3)?,
                    target_name: row.get(4)?,
                    target_url: row.get(5)?,
                    campaign_id: row.get(6)?,
                    status: row.get(7)?,
                    detail: row.get(8)?,
                    created_at: parse_ts(&created_at),
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }
}
