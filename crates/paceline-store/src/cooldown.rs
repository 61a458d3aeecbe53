//! Contact registry — cross-sender cooldowns on repeat targets.
//!
//! Rows are keyed (target_url, sender_id, action_kind), but the cooldown
//! check scans by target + kind only: once any sender has acted on a
//! target, every sender waits out the window for that kind.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use rusqlite::params;

use paceline_core::error::Result;
use paceline_core::types::ActionKind;

use crate::records::{parse_ts, CooldownEntry};
use crate::{db_err, Store};

impl Store {
    /// Upsert a registry entry: refresh `acted_at` and the deadline.
    ///
    /// Timestamps are normalized to UTC on write so the string comparison
    /// in [`Store::acted_on_since`] stays correct even when the configured
    /// offset changes between deployments.
    pub fn record_cooldown(
        &self,
        target_url: &str,
        sender_id: i64,
        kind: ActionKind,
        acted_at: DateTime<FixedOffset>,
        cooldown: Duration,
    ) -> Result<()> {
        let until = acted_at + cooldown;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO contact_registry
                 (target_url, sender_id, action_kind, acted_at, cooldown_until)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(target_url, sender_id, action_kind)
             DO UPDATE SET acted_at = ?4, cooldown_until = ?5",
            params![
                target_url,
                sender_id,
                kind.as_str(),
                acted_at.with_timezone(&Utc).to_rfc3339(),
                until.with_timezone(&Utc).to_rfc3339(),
            ],
        )
        .map_err(db_err)?;
        Ok(())
    }

    /// True if any sender acted on `target_url` with `kind` at or after
    /// `since` — the cross-sender cooldown check.
    pub fn acted_on_since(
        &self,
        target_url: &str,
        kind: ActionKind,
        since: DateTime<FixedOffset>,
    ) -> Result<bool> {
        let conn = self.conn()?;
        let count: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM contact_registry
                 WHERE target_url = ?1 AND action_kind = ?2 AND acted_at >= ?3",
                params![target_url, kind.as_str(), since.with_timezone(&Utc).to_rfc3339()],
                |row| row.get(0),
            )
            .map_err(db_err)?;
        Ok(count > 0)
    }

    /// All registry entries for a target, for inspection.
    pub fn cooldown_entries(&self, target_url: &str) -> Result<Vec<CooldownEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT target_url, sender_id, action_kind, acted_at, cooldown_until
                 FROM contact_registry WHERE target_url = ?1 ORDER BY acted_at DESC",
            )
            .map_err(db_err)?;
        let rows = stmt
            .query_map([target_url], |row| {
                let kind: String = row.get(2)?;
                let acted_at: String = row.get(3)?;
                let until: String = row.get(4)?;
                Ok(CooldownEntry {
                    target_url: row.get(0)?,
                    sender_id: row.get(1)?,
                    kind: kind.parse().unwrap_or(ActionKind::Like),
                    acted_at: parse_ts(&acted_at),
                    cooldown_until: parse_ts(&until),
                })
            })
            .map_err(db_err)?;
        rows.collect::<rusqlite::Result<Vec<_>>>().map_err(db_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_cross_sender_visibility() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now().fixed_offset();
        let a = store.add_sender("A", "a@example.com", now).unwrap();
        let _b = store.add_sender("B", "b@example.com", now).unwrap();

        store
            .record_cooldown("https://example.com/t", a, ActionKind::Comment, now, Duration::hours(72))
            .unwrap();

        // Visible regardless of which sender asks — the query has no sender key.
        let since = now - Duration::hours(72);
        assert!(store.acted_on_since("https://example.com/t", ActionKind::Comment, since).unwrap());
        // A different action kind on the same target is not on cooldown.
        assert!(!store.acted_on_since("https://example.com/t", ActionKind::Like, since).unwrap());
        // A different target is not on cooldown.
        assert!(!store.acted_on_since("https://example.com/u", ActionKind::Comment, since).unwrap());
    }

    #[test]
    fn test_offsets_normalized_before_comparison() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now().fixed_offset();
        let a = store.add_sender("A", "a@example.com", now).unwrap();

        // Written under a +05:30 clock, queried under a -03:00 one.
        let ist = chrono::FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let brt = chrono::FixedOffset::west_opt(3 * 3600).unwrap();
        let acted = (now - Duration::hours(1)).with_timezone(&ist);
        store
            .record_cooldown("https://example.com/t", a, ActionKind::Like, acted, Duration::hours(72))
            .unwrap();

        let cutoff = (now - Duration::hours(72)).with_timezone(&brt);
        assert!(store.acted_on_since("https://example.com/t", ActionKind::Like, cutoff).unwrap());

        // An entry older than the window stays expired regardless of the
        // offset it was written with.
        let b_url = "https://example.com/u";
        let stale = (now - Duration::hours(100)).with_timezone(&ist);
        store
            .record_cooldown(b_url, a, ActionKind::Like, stale, Duration::hours(72))
            .unwrap();
        assert!(!store.acted_on_since(b_url, ActionKind::Like, cutoff).unwrap());
    }

    #[test]
    fn test_upsert_refreshes_deadline() {
        let store = Store::open_in_memory().unwrap();
        let now = Utc::now().fixed_offset();
        let a = store.add_sender("A", "a@example.com", now).unwrap();

        let old = now - Duration::hours(100);
        store
            .record_cooldown("https://example.com/t", a, ActionKind::Like, old, Duration::hours(72))
            .unwrap();
        // Expired by now.
        assert!(!store
            .acted_on_since("https://example.com/t", ActionKind::Like, now - Duration::hours(72))
            .unwrap());

        store
            .record_cooldown("https://example.com/t", a, ActionKind::Like, now, Duration::hours(72))
            .unwrap();
        let entries = store.cooldown_entries("https://example.com/t").unwrap();
        assert_eq!(entries.len(), 1);
        assert!(store
            .acted_on_since("https://example.com/t", ActionKind::Like, now - Duration::hours(72))
            .unwrap());
    }
}
