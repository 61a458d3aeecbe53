//! Daily counters — (date, sender, kind) → count.
//!
//! The increment is a single keyed upsert, so concurrent workers bumping
//! the same key can never lose an update. Counts are never decremented.

use rusqlite::params;

use paceline_core::error::Result;
use paceline_core::types::ActionKind;

use crate::records::DayCounts;
use crate::{db_err, Store};

impl Store {
    /// Increment the counter for (date, sender, kind) by one.
    pub fn increment_counter(&self, date: &str, sender_id: i64, kind: ActionKind) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO daily_counters (date, sender_id, action_kind, count)
             VALUES (?1, ?2, ?3, 1)
             ON CONFLICT(date, sender_id, action_kind)
             DO UPDATE SET count = count + 1",
            params![date, sender_id, kind.as_str()],
        )
        .map_err(db_err)?;
        tracing::debug!(date, sender_id, kind = %kind, "counter incremented");
        Ok(())
    }

    /// Count for one sender/kind on one date.
    pub fn daily_count(&self, date: &str, sender_id: i64, kind: ActionKind) -> Result<u32> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM daily_counters
             WHERE date = ?1 AND sender_id = ?2 AND action_kind = ?3",
            params![date, sender_id, kind.as_str()],
            |row| row.get::<_, u32>(0),
        )
        .map_err(db_err)
    }

    /// Sum of counts since `since_date` inclusive (normally the Monday of
    /// the current week).
    pub fn weekly_count(&self, since_date: &str, sender_id: i64, kind: ActionKind) -> Result<u32> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT COALESCE(SUM(count), 0) FROM daily_counters
             WHERE sender_id = ?1 AND action_kind = ?2 AND date >= ?3",
            params![sender_id, kind.as_str(), since_date],
            |row| row.get::<_, u32>(0),
        )
        .map_err(db_err)
    }

    /// Today's per-kind counts for one sender, for reporting.
    pub fn day_counts(&self, date: &str, sender_id: i64) -> Result<DayCounts> {
        Ok(DayCounts {
            likes: self.daily_count(date, sender_id, ActionKind::Like)?,
            comments: self.daily_count(date, sender_id, ActionKind::Comment)?,
            connects: self.daily_count(date, sender_id, ActionKind::Connect)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn seed_sender(store: &Store) -> i64 {
        store
            .add_sender("S", "s@example.com", Utc::now().fixed_offset())
            .unwrap()
    }

    #[test]
    fn test_increment_upsert() {
        let store = Store::open_in_memory().unwrap();
        let sender = seed_sender(&store);
        for _ in 0..5 {
            store.increment_counter("2026-08-24", sender, ActionKind::Like).unwrap();
        }
        assert_eq!(store.daily_count("2026-08-24", sender, ActionKind::Like).unwrap(), 5);
        // Other kinds and dates are untouched.
        assert_eq!(store.daily_count("2026-08-24", sender, ActionKind::Comment).unwrap(), 0);
        assert_eq!(store.daily_count("2026-08-25", sender, ActionKind::Like).unwrap(), 0);
    }

    #[test]
    fn test_concurrent_increments_all_land() {
        let store = Store::open_in_memory().unwrap();
        let sender = seed_sender(&store);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        store
                            .increment_counter("2026-08-24", sender, ActionKind::Like)
                            .unwrap();
                    }
                });
            }
        });

        assert_eq!(
            store.daily_count("2026-08-24", sender, ActionKind::Like).unwrap(),
            200
        );
    }

    #[test]
    fn test_weekly_sum() {
        let store = Store::open_in_memory().unwrap();
        let sender = seed_sender(&store);
        // Week of Mon 2026-08-24; the prior Friday must not count.
        store.increment_counter("2026-08-21", sender, ActionKind::Like).unwrap();
        store.increment_counter("2026-08-24", sender, ActionKind::Like).unwrap();
        store.increment_counter("2026-08-25", sender, ActionKind::Like).unwrap();
        store.increment_counter("2026-08-25", sender, ActionKind::Like).unwrap();

        assert_eq!(store.weekly_count("2026-08-24", sender, ActionKind::Like).unwrap(), 3);
    }

    #[test]
    fn test_no_cross_sender_interference() {
        let store = Store::open_in_memory().unwrap();
        let a = seed_sender(&store);
        let b = store
            .add_sender("B", "b@example.com", Utc::now().fixed_offset())
            .unwrap();
        store.increment_counter("2026-08-24", a, ActionKind::Connect).unwrap();
        store.increment_counter("2026-08-24", b, ActionKind::Connect).unwrap();
        store.increment_counter("2026-08-24", b, ActionKind::Connect).unwrap();

        assert_eq!(store.daily_count("2026-08-24", a, ActionKind::Connect).unwrap(), 1);
        assert_eq!(store.daily_count("2026-08-24", b, ActionKind::Connect).unwrap(), 2);
    }

    #[test]
    fn test_day_counts() {
        let store = Store::open_in_memory().unwrap();
        let sender = seed_sender(&store);
        store.increment_counter("2026-08-24", sender, ActionKind::Like).unwrap();
        store.increment_counter("2026-08-24", sender, ActionKind::Comment).unwrap();
        let counts = store.day_counts("2026-08-24", sender).unwrap();
        assert_eq!(counts.likes, 1);
        assert_eq!(counts.comments, 1);
        assert_eq!(counts.connects, 0);
    }
}
