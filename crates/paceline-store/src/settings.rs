//! Key/value settings — operator overrides read at gating time.
//!
//! Gating components consult these before the file config on every
//! check, so an edit takes effect on the next action item.

use rusqlite::params;

use paceline_core::error::Result;

use crate::{db_err, Store};

impl Store {
    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )
        .map_err(db_err)?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT value FROM settings WHERE key = ?1")
            .map_err(db_err)?;
        let mut rows = stmt
            .query_map([key], |row| row.get::<_, String>(0))
            .map_err(db_err)?;
        match rows.next() {
            Some(row) => Ok(Some(row.map_err(db_err)?)),
            None => Ok(None),
        }
    }

    /// Integer setting; malformed or missing values read as `None`.
    pub fn setting_i64(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.get_setting(key)?.and_then(|v| v.trim().parse().ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_and_overwrite() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.get_setting("work_hour_start").unwrap(), None);

        store.set_setting("work_hour_start", "10").unwrap();
        assert_eq!(store.setting_i64("work_hour_start").unwrap(), Some(10));

        store.set_setting("work_hour_start", "11").unwrap();
        assert_eq!(store.setting_i64("work_hour_start").unwrap(), Some(11));
    }

    #[test]
    fn test_malformed_int_reads_as_none() {
        let store = Store::open_in_memory().unwrap();
        store.set_setting("daily_like_limit", "lots").unwrap();
        assert_eq!(store.setting_i64("daily_like_limit").unwrap(), None);
    }
}
