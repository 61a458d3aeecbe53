//! # Paceline Store
//!
//! SQLite-backed persistence for the scheduler core — survives restarts,
//! one file, no external services.
//!
//! A single [`Store`] wraps the connection behind a mutex; every mutation
//! is a single statement (or one explicit transaction), so upserts like
//! the daily-counter increment are atomic per key even when several
//! campaign workers race on the same sender.
//!
//! Tables:
//! - `senders` — actor accounts with per-kind cap overrides
//! - `target_lists` / `targets` — who campaigns act on
//! - `campaigns` — batch jobs with aggregate counters
//! - `action_queue` — one row per queued action item
//! - `daily_counters` — (date, sender, kind) → count
//! - `contact_registry` — cross-sender cooldown entries
//! - `activity_log` — append-only audit trail
//! - `settings` — operator overrides read at gating time

mod activity;
mod campaigns;
mod cooldown;
mod counters;
mod queue;
mod records;
mod senders;
mod settings;
mod targets;

pub use records::{
    ActionItem, ActivityRecord, Campaign, CooldownEntry, DayCounts, NewActionItem, NewActivity,
    Sender, Target, TargetList,
};

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use paceline_core::error::{PacelineError, Result};

/// Map a rusqlite failure into the crate error.
pub(crate) fn db_err(e: rusqlite::Error) -> PacelineError {
    PacelineError::Store(e.to_string())
}

/// The persistent store. Cheap to share via `Arc`.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path).map_err(db_err)?;
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        // WAL keeps readers unblocked while a worker writes.
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA foreign_keys=ON;",
        )
        .ok();
        let store = Self { conn: Mutex::new(conn) };
        store.migrate()?;
        Ok(store)
    }

    pub(crate) fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| PacelineError::Store(format!("connection lock poisoned: {e}")))
    }

    /// Create tables and indexes.
    fn migrate(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS senders (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                account_ref     TEXT NOT NULL UNIQUE,
                status          TEXT NOT NULL DEFAULT 'active'
                                CHECK(status IN ('active','paused','disabled')),
                daily_like_limit     INTEGER,
                weekly_like_limit    INTEGER,
                daily_comment_limit  INTEGER,
                weekly_comment_limit INTEGER,
                daily_connect_limit  INTEGER,
                weekly_connect_limit INTEGER,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS target_lists (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                name        TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS targets (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                list_id         INTEGER NOT NULL REFERENCES target_lists(id) ON DELETE CASCADE,
                name            TEXT NOT NULL,
                url             TEXT NOT NULL,
                is_liked        INTEGER NOT NULL DEFAULT 0,
                is_commented    INTEGER NOT NULL DEFAULT 0,
                is_connected    INTEGER NOT NULL DEFAULT 0,
                last_action_at  TEXT,
                created_at      TEXT NOT NULL,
                UNIQUE(list_id, url)
            );

            CREATE TABLE IF NOT EXISTS campaigns (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL,
                list_id         INTEGER NOT NULL REFERENCES target_lists(id),
                sender_id       INTEGER NOT NULL REFERENCES senders(id),
                action_kind     TEXT NOT NULL CHECK(action_kind IN ('like','comment','connect')),
                status          TEXT NOT NULL DEFAULT 'draft'
                                CHECK(status IN ('draft','active','paused','completed','cancelled')),
                note            TEXT,
                total           INTEGER NOT NULL DEFAULT 0,
                processed       INTEGER NOT NULL DEFAULT 0,
                successful      INTEGER NOT NULL DEFAULT 0,
                failed          INTEGER NOT NULL DEFAULT 0,
                skipped         INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                started_at      TEXT,
                completed_at    TEXT
            );

            CREATE TABLE IF NOT EXISTS action_queue (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                campaign_id     INTEGER NOT NULL REFERENCES campaigns(id),
                target_id       INTEGER NOT NULL REFERENCES targets(id),
                sender_id       INTEGER NOT NULL REFERENCES senders(id),
                action_kind     TEXT NOT NULL CHECK(action_kind IN ('like','comment','connect')),
                status          TEXT NOT NULL DEFAULT 'pending'
                                CHECK(status IN ('pending','scheduled','running','done','failed','skipped')),
                target_name     TEXT NOT NULL DEFAULT '',
                target_url      TEXT NOT NULL,
                payload         TEXT,
                completed_at    TEXT,
                error_detail    TEXT,
                created_at      TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS daily_counters (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                date        TEXT NOT NULL,
                sender_id   INTEGER NOT NULL REFERENCES senders(id),
                action_kind TEXT NOT NULL,
                count       INTEGER NOT NULL DEFAULT 0,
                UNIQUE(date, sender_id, action_kind)
            );

            CREATE TABLE IF NOT EXISTS contact_registry (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                target_url      TEXT NOT NULL,
                sender_id       INTEGER NOT NULL REFERENCES senders(id),
                action_kind     TEXT NOT NULL CHECK(action_kind IN ('like','comment','connect')),
                acted_at        TEXT NOT NULL,
                cooldown_until  TEXT NOT NULL,
                UNIQUE(target_url, sender_id, action_kind)
            );

            CREATE TABLE IF NOT EXISTS activity_log (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                action_kind TEXT NOT NULL,
                sender_id   INTEGER,
                sender_name TEXT NOT NULL DEFAULT '',
                target_name TEXT NOT NULL DEFAULT '',
                target_url  TEXT NOT NULL DEFAULT '',
                campaign_id INTEGER,
                status      TEXT NOT NULL,
                detail      TEXT NOT NULL DEFAULT '',
                created_at  TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS settings (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_cr_target ON contact_registry(target_url, action_kind);
            CREATE INDEX IF NOT EXISTS idx_cr_acted ON contact_registry(acted_at);
            CREATE INDEX IF NOT EXISTS idx_aq_campaign ON action_queue(campaign_id, status);
            CREATE INDEX IF NOT EXISTS idx_aq_sender ON action_queue(sender_id, status);
            CREATE INDEX IF NOT EXISTS idx_dc_key ON daily_counters(date, sender_id);
            CREATE INDEX IF NOT EXISTS idx_campaigns_status ON campaigns(status);
            CREATE INDEX IF NOT EXISTS idx_targets_list ON targets(list_id);
            CREATE INDEX IF NOT EXISTS idx_al_created ON activity_log(created_at);
            ",
        )
        .map_err(db_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_migrate() {
        let store = Store::open_in_memory().unwrap();
        assert!(store.list_senders().unwrap().is_empty());
        assert!(store.list_campaigns().unwrap().is_empty());
    }

    #[test]
    fn test_open_on_disk() {
        let dir = std::env::temp_dir().join("paceline-store-open-test");
        std::fs::create_dir_all(&dir).ok();
        let store = Store::open(&dir.join("test.db")).unwrap();
        assert!(store.list_senders().unwrap().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
