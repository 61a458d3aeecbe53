//! Cross-sender cooldown checks over the shared contact registry.
//!
//! A hit on any sender blocks every sender for the same target and
//! kind until the window elapses. Different kinds never interfere.

use std::sync::Arc;

use chrono::Duration;

use paceline_core::clock;
use paceline_core::error::Result;
use paceline_core::types::ActionKind;
use paceline_core::PacelineConfig;
use paceline_store::Store;

pub struct CooldownRegistry {
    store: Arc<Store>,
    config: Arc<PacelineConfig>,
}

impl CooldownRegistry {
    pub fn new(store: Arc<Store>, config: Arc<PacelineConfig>) -> Self {
        Self { store, config }
    }

    fn cooldown_hours(&self) -> Result<i64> {
        if let Some(v) = self.store.setting_i64("cooldown_hours")? {
            return Ok(v.max(0));
        }
        Ok(self.config.cooldown_hours)
    }

    /// True when any sender acted on `target_url` with `kind` inside
    /// the cooldown window.
    pub fn is_on_cooldown(&self, target_url: &str, kind: ActionKind) -> Result<bool> {
        let hours = self.cooldown_hours()?;
        let since = clock::local_now(self.config.utc_offset_minutes) - Duration::hours(hours);
        self.store.acted_on_since(target_url, kind, since)
    }

    /// Record a completed action so other senders back off.
    pub fn record(&self, target_url: &str, sender_id: i64, kind: ActionKind) -> Result<()> {
        let now = clock::local_now(self.config.utc_offset_minutes);
        let hours = self.cooldown_hours()?;
        self.store
            .record_cooldown(target_url, sender_id, kind, now, Duration::hours(hours))
    }
}
