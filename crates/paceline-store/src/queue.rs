//! Action queue — one row per unit of queued work.

use chrono::{DateTime, FixedOffset};
use rusqlite::params;

use paceline_core::error::Result;
use paceline_core::types::{ActionKind, ItemStatus};

use crate::records::{parse_ts, parse_ts_opt, ActionItem, NewActionItem};
use crate::{db_err, Store};

const ITEM_COLS: &str = "id, campaign_id, target_id, sender_id, action_kind, status, \
     target_name, target_url, payload, completed_at, error_detail, created_at";

fn item_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ActionItem> {
    let kind: String = row.get(4)?;
    let status: String = row.get(5)?;
    let created_at: String = row.get(11)?;
    Ok(ActionItem {
        id: row.get(0)?,
        campaign_id: row.get(1)?,
        target_id: row.get(2)?,
        sender_id: row.get(3)?,
        kind: kind.parse().unwrap_or(ActionKind::Like),
        status: status.parse().unwrap_or(ItemStatus::Pending),
        target_name: row.get(6)?,
        target_url: row.get(7)?,
        payload: row.get(8)?,
        completed_at: parse_ts_opt(row.get(9)?),
        error_detail: row.get(10)?,
        created_at: parse_ts(&created_at),
    })
}

impl Store {
    /// Bulk-insert pending items for a campaign start, in one transaction
    /// so a partially materialized queue can never be observed. The
    /// emptiness guard lives inside the same transaction: a campaign that
    /// already holds items gets nothing appended, even when two starts
    /// race. Returns how many rows were inserted (0 when guarded).
    pub fn enqueue_items(
        &self,
        campaign_id: i64,
        sender_id: i64,
        kind: ActionKind,
        items: &[NewActionItem],
        created_at: DateTime<FixedOffset>,
    ) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        let existing: i64 = tx
            .query_row(
                "SELECT COUNT(*) FROM action_queue WHERE campaign_id = ?1",
                [campaign_id],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        if existing > 0 {
            return Ok(0);
        }
        for item in items {
            tx.execute(
                "INSERT INTO action_queue
                     (campaign_id, target_id, sender_id, action_kind,
                      target_name, target_url, payload, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    campaign_id,
                    item.target_id,
                    sender_id,
                    kind.as_str(),
                    item.target_name,
                    item.target_url,
                    item.payload,
                    created_at.to_rfc3339(),
                ],
            )
            .map_err(db_err)?;
        }
        tx.commit().map_err(db_err)?;
        Ok(items.len())
    }

    /// Pending items for a campaign, in creation (FIFO) order.
    ///
    /// Deliberately excludes `running` rows: an item left `running` by a
    /// crash mid-dispatch waits for operator reconciliation and is never
    /// re-run automatically.
    pub fn pending_items(&self, campaign_id: i64) -> Result<Vec<ActionItem>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ITEM_COLS} FROM action_queue
                 WHERE campaign_id = ?1 AND status = 'pending'
                 ORDER BY id ASC"
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map([campaign_id], item_from_row).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// All items for a campaign, for inspection.
    pub fn items_for_campaign(&self, campaign_id: i64) -> Result<Vec<ActionItem>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(&format!(
                "SELECT {ITEM_COLS} FROM action_queue WHERE campaign_id = ?1 ORDER BY id ASC"
            ))
            .map_err(db_err)?;
        let rows = stmt.query_map([campaign_id], item_from_row).map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }

    /// Number of items stuck in `running` (crash leftovers).
    pub fn running_items_count(&self, campaign_id: i64) -> Result<u32> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COUNT(*) FROM action_queue WHERE campaign_id = ?1 AND status = 'running'",
            [campaign_id],
            |row| row.get::<_, u32>(0),
        )
        .map_err(db_err)
    }

    /// Claim an item for dispatch, persisted before the actuator runs.
    /// Conditional on the row still being claimable: a concurrent cancel
    /// may have skipped it between the pending scan and the claim.
    /// Returns false when the row was taken.
    pub fn mark_item_running(&self, item_id: i64) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn
            .execute(
                "UPDATE action_queue SET status = 'running'
                 WHERE id = ?1 AND status IN ('pending', 'scheduled')",
                [item_id],
            )
            .map_err(db_err)?;
        Ok(n > 0)
    }

    /// Finish an item with a terminal status and optional error detail.
    /// A row already in a terminal state is left untouched; returns
    /// whether the row changed.
    pub fn complete_item(
        &self,
        item_id: i64,
        status: ItemStatus,
        completed_at: DateTime<FixedOffset>,
        error_detail: Option<&str>,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let n = conn
            .execute(
                "UPDATE action_queue SET status = ?1, completed_at = ?2, error_detail = ?3
                 WHERE id = ?4 AND status NOT IN ('done', 'failed', 'skipped')",
                params![status.as_str(), completed_at.to_rfc3339(), error_detail, item_id],
            )
            .map_err(db_err)?;
        Ok(n > 0)
    }

    /// Bulk-skip every remaining `pending`/`scheduled` item of a campaign
    /// (the cancel path). Returns how many rows changed.
    pub fn skip_remaining_items(
        &self,
        campaign_id: i64,
        at: DateTime<FixedOffset>,
    ) -> Result<u32> {
        let conn = self.conn()?;
        let n = conn
            .execute(
                "UPDATE action_queue SET status = 'skipped', completed_at = ?1
                 WHERE campaign_id = ?2 AND status IN ('pending', 'scheduled')",
                params![at.to_rfc3339(), campaign_id],
            )
            .map_err(db_err)?;
        Ok(n as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn seed(store: &Store) -> (i64, i64) {
        let now = Utc::now().fixed_offset();
        let sender = store.add_sender("S", "s@example.com", now).unwrap();
        let list = store.create_list("L", "", now).unwrap();
        for i in 0..3 {
            store
                .add_target(list, &format!("t{i}"), &format!("https://example.com/t{i}"), now)
                .unwrap();
        }
        let campaign = store
            .create_campaign("C", list, sender, ActionKind::Like, None, 2, now)
            .unwrap();
        (campaign, sender)
    }

    fn items(n: usize) -> Vec<NewActionItem> {
        (0..n)
            .map(|i| NewActionItem {
                target_id: i as i64 + 1,
                target_name: format!("t{i}"),
                target_url: format!("https://example.com/t{i}"),
                payload: None,
            })
            .collect()
    }

    #[test]
    fn test_enqueue_and_fifo_order() {
        let store = Store::open_in_memory().unwrap();
        let (campaign, sender) = seed(&store);
        let now = Utc::now().fixed_offset();
        store
            .enqueue_items(campaign, sender, ActionKind::Like, &items(3), now)
            .unwrap();

        let pending = store.pending_items(campaign).unwrap();
        assert_eq!(pending.len(), 3);
        assert!(pending.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(pending[0].target_name, "t0");
    }

    #[test]
    fn test_running_items_excluded_from_pending() {
        let store = Store::open_in_memory().unwrap();
        let (campaign, sender) = seed(&store);
        let now = Utc::now().fixed_offset();
        store
            .enqueue_items(campaign, sender, ActionKind::Like, &items(2), now)
            .unwrap();

        let first = store.pending_items(campaign).unwrap()[0].id;
        assert!(store.mark_item_running(first).unwrap());

        assert_eq!(store.pending_items(campaign).unwrap().len(), 1);
        assert_eq!(store.running_items_count(campaign).unwrap(), 1);
    }

    #[test]
    fn test_complete_and_skip_remaining() {
        let store = Store::open_in_memory().unwrap();
        let (campaign, sender) = seed(&store);
        let now = Utc::now().fixed_offset();
        store
            .enqueue_items(campaign, sender, ActionKind::Like, &items(3), now)
            .unwrap();

        let pending = store.pending_items(campaign).unwrap();
        store
            .complete_item(pending[0].id, ItemStatus::Failed, now, Some("network down"))
            .unwrap();

        let skipped = store.skip_remaining_items(campaign, now).unwrap();
        assert_eq!(skipped, 2);
        assert!(store.pending_items(campaign).unwrap().is_empty());

        let all = store.items_for_campaign(campaign).unwrap();
        assert_eq!(all[0].status, ItemStatus::Failed);
        assert_eq!(all[0].error_detail.as_deref(), Some("network down"));
        assert!(all[1..].iter().all(|i| i.status == ItemStatus::Skipped));
    }

    #[test]
    fn test_enqueue_is_once_per_campaign() {
        let store = Store::open_in_memory().unwrap();
        let (campaign, sender) = seed(&store);
        let now = Utc::now().fixed_offset();

        let first = store
            .enqueue_items(campaign, sender, ActionKind::Like, &items(3), now)
            .unwrap();
        assert_eq!(first, 3);

        // A second materialization attempt inserts nothing.
        let second = store
            .enqueue_items(campaign, sender, ActionKind::Like, &items(3), now)
            .unwrap();
        assert_eq!(second, 0);
        assert_eq!(store.items_for_campaign(campaign).unwrap().len(), 3);
    }

    #[test]
    fn test_terminal_rows_cannot_be_claimed_or_recompleted() {
        let store = Store::open_in_memory().unwrap();
        let (campaign, sender) = seed(&store);
        let now = Utc::now().fixed_offset();
        store
            .enqueue_items(campaign, sender, ActionKind::Like, &items(2), now)
            .unwrap();

        // A cancel bulk-skips everything; the row is no longer claimable.
        store.skip_remaining_items(campaign, now).unwrap();
        let all = store.items_for_campaign(campaign).unwrap();
        assert!(!store.mark_item_running(all[0].id).unwrap());
        assert!(!store
            .complete_item(all[0].id, ItemStatus::Done, now, None)
            .unwrap());

        let after = store.items_for_campaign(campaign).unwrap();
        assert!(after.iter().all(|i| i.status == ItemStatus::Skipped));
    }
}
