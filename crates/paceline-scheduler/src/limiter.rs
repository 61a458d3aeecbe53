//! Rate limiter — daily/weekly caps with ramp-up scaling.
//!
//! Cap resolution order, re-read on every check: per-sender override
//! column → `settings` table → file config. Senders younger than the
//! ramp-up window get their caps scaled down to the configured
//! percentage, floored.

use std::sync::Arc;

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

use paceline_core::clock;
use paceline_core::error::{PacelineError, Result};
use paceline_core::types::ActionKind;
use paceline_core::PacelineConfig;
use paceline_store::{Sender, Store};

/// The answer to "may this sender act right now?".
#[derive(Debug, Clone, Serialize)]
pub struct LimitDecision {
    pub allowed: bool,
    pub daily_used: u32,
    pub daily_limit: u32,
    pub weekly_used: u32,
    pub weekly_limit: u32,
    /// Denial cause, or the active ramp-up note on an allowed decision.
    pub reason: String,
}

pub struct RateLimiter {
    store: Arc<Store>,
    config: Arc<PacelineConfig>,
}

impl RateLimiter {
    pub fn new(store: Arc<Store>, config: Arc<PacelineConfig>) -> Self {
        Self { store, config }
    }

    /// Ramp-up multiplier for a sender at `now`: the configured
    /// percentage while the sender is younger than the ramp window,
    /// 1.0 after.
    fn ramp_factor(&self, sender: &Sender, now: DateTime<FixedOffset>) -> f64 {
        let cutoff = now - Duration::weeks(i64::from(self.config.ramp_up.weeks));
        if sender.created_at > cutoff {
            f64::from(self.config.ramp_up.percentage) / 100.0
        } else {
            1.0
        }
    }

    fn base_daily_limit(&self, sender: &Sender, kind: ActionKind) -> Result<u32> {
        if let Some(cap) = sender.daily_cap(kind) {
            return Ok(cap);
        }
        if let Some(v) = self.store.setting_i64(&format!("daily_{kind}_limit"))? {
            return Ok(v.max(0) as u32);
        }
        Ok(self.config.limits.for_kind(kind).daily)
    }

    fn base_weekly_limit(&self, sender: &Sender, kind: ActionKind) -> Result<u32> {
        if let Some(cap) = sender.weekly_cap(kind) {
            return Ok(cap);
        }
        if let Some(v) = self.store.setting_i64(&format!("weekly_{kind}_limit"))? {
            return Ok(v.max(0) as u32);
        }
        Ok(self.config.limits.for_kind(kind).weekly)
    }

    /// Check whether `sender_id` may perform a `kind` action right now.
    pub fn check(&self, sender_id: i64, kind: ActionKind) -> Result<LimitDecision> {
        let sender = self
            .store
            .get_sender(sender_id)?
            .ok_or(PacelineError::SenderNotFound(sender_id))?;

        let offset = self.config.utc_offset_minutes;
        let now = clock::local_now(offset);
        let factor = self.ramp_factor(&sender, now);

        let daily_limit = (f64::from(self.base_daily_limit(&sender, kind)?) * factor).floor() as u32;
        let weekly_limit =
            (f64::from(self.base_weekly_limit(&sender, kind)?) * factor).floor() as u32;

        let daily_used = self.store.daily_count(&clock::today_str(offset), sender_id, kind)?;
        let weekly_used = self.store.weekly_count(&clock::monday_str(offset), sender_id, kind)?;

        let mut allowed = true;
        let mut reason = String::new();

        if daily_used >= daily_limit {
            allowed = false;
            reason = format!("daily {kind} limit reached ({daily_used}/{daily_limit})");
        } else if weekly_used >= weekly_limit {
            allowed = false;
            reason = format!("weekly {kind} limit reached ({weekly_used}/{weekly_limit})");
        }

        if factor < 1.0 && reason.is_empty() {
            reason = format!("ramp-up active ({}% of full limits)", self.config.ramp_up.percentage);
        }

        Ok(LimitDecision { allowed, daily_used, daily_limit, weekly_used, weekly_limit, reason })
    }

    /// Bump today's counter. Called only after a confirmed successful
    /// dispatch.
    pub fn increment(&self, sender_id: i64, kind: ActionKind) -> Result<()> {
        let today = clock::today_str(self.config.utc_offset_minutes);
        self.store.increment_counter(&today, sender_id, kind)
    }
}
