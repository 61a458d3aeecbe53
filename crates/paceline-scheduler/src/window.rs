//! Work-hours gate. Outside the window workers idle instead of exiting.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Weekday};

use paceline_core::clock;
use paceline_core::error::Result;
use paceline_core::PacelineConfig;
use paceline_store::Store;

pub struct ExecutionWindow {
    store: Arc<Store>,
    config: Arc<PacelineConfig>,
}

pub(crate) fn parse_days(spec: &str) -> HashSet<Weekday> {
    spec.split(',')
        .filter_map(|d| match d.trim().to_ascii_lowercase().as_str() {
            "mon" => Some(Weekday::Mon),
            "tue" => Some(Weekday::Tue),
            "wed" => Some(Weekday::Wed),
            "thu" => Some(Weekday::Thu),
            "fri" => Some(Weekday::Fri),
            "sat" => Some(Weekday::Sat),
            "sun" => Some(Weekday::Sun),
            _ => None,
        })
        .collect()
}

impl ExecutionWindow {
    pub fn new(store: Arc<Store>, config: Arc<PacelineConfig>) -> Self {
        Self { store, config }
    }

    fn start_hour(&self) -> Result<u32> {
        if let Some(v) = self.store.setting_i64("work_start_hour")? {
            return Ok(v.clamp(0, 23) as u32);
        }
        Ok(self.config.work_window.start_hour)
    }

    fn end_hour(&self) -> Result<u32> {
        if let Some(v) = self.store.setting_i64("work_end_hour")? {
            return Ok(v.clamp(0, 24) as u32);
        }
        Ok(self.config.work_window.end_hour)
    }

    fn days(&self) -> Result<HashSet<Weekday>> {
        let spec = match self.store.get_setting("work_days")? {
            Some(s) => s,
            None => self.config.work_window.days.clone(),
        };
        Ok(parse_days(&spec))
    }

    /// Whether `at` falls inside the window. Hours are half-open
    /// [start, end); an empty day set leaves weekdays unrestricted.
    pub fn is_open_at(&self, at: DateTime<FixedOffset>) -> Result<bool> {
        let days = self.days()?;
        if !days.is_empty() && !days.contains(&at.weekday()) {
            return Ok(false);
        }
        let hour = at.hour();
        Ok(hour >= self.start_hour()? && hour < self.end_hour()?)
    }

    pub fn is_open(&self) -> Result<bool> {
        self.is_open_at(clock::local_now(self.config.utc_offset_minutes))
    }

    /// How long to sleep between window polls while closed.
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.config.work_window.poll_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn setup() -> ExecutionWindow {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let config = Arc::new(PacelineConfig { utc_offset_minutes: 0, ..Default::default() });
        ExecutionWindow::new(store, config)
    }

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(y, m, d, h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_weekday_inside_hours_is_open() {
        let window = setup();
        // 2026-08-26 is a Wednesday.
        assert!(window.is_open_at(at(2026, 8, 26, 9)).unwrap());
        assert!(window.is_open_at(at(2026, 8, 26, 17)).unwrap());
    }

    #[test]
    fn test_end_hour_is_exclusive() {
        let window = setup();
        assert!(!window.is_open_at(at(2026, 8, 26, 18)).unwrap());
        assert!(!window.is_open_at(at(2026, 8, 26, 8)).unwrap());
    }

    #[test]
    fn test_weekend_is_closed() {
        let window = setup();
        // 2026-08-29 is a Saturday.
        assert!(!window.is_open_at(at(2026, 8, 29, 12)).unwrap());
    }

    #[test]
    fn test_settings_override_hours_and_days() {
        let window = setup();
        window.store.set_setting("work_start_hour", "0").unwrap();
        window.store.set_setting("work_end_hour", "24").unwrap();
        window.store.set_setting("work_days", "sat,sun").unwrap();

        assert!(window.is_open_at(at(2026, 8, 29, 3)).unwrap());
        assert!(!window.is_open_at(at(2026, 8, 26, 12)).unwrap());
    }

    #[test]
    fn test_unparseable_days_fall_open() {
        let window = setup();
        window.store.set_setting("work_days", "every day").unwrap();
        // Garbage day spec drops the weekday restriction entirely.
        assert!(window.is_open_at(at(2026, 8, 30, 12)).unwrap());
    }

    #[test]
    fn test_parse_days() {
        let days = parse_days("mon, Tue,WED");
        assert_eq!(days.len(), 3);
        assert!(days.contains(&Weekday::Wed));
        assert!(parse_days("").is_empty());
    }
}
