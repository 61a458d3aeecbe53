//! Activity feed writer. Every dispatch attempt lands here, success or
//! not, and is mirrored to the tracing log.

use std::sync::Arc;

use paceline_core::clock;
use paceline_core::error::Result;
use paceline_core::PacelineConfig;
use paceline_store::{NewActivity, Store};

use crate::actuator::{ActionOutcome, ActionRequest};

pub struct ActivityLogger {
    store: Arc<Store>,
    config: Arc<PacelineConfig>,
}

impl ActivityLogger {
    pub fn new(store: Arc<Store>, config: Arc<PacelineConfig>) -> Self {
        Self { store, config }
    }

    fn sender_name(&self, sender_id: i64) -> String {
        match self.store.get_sender(sender_id) {
            Ok(Some(sender)) => sender.name,
            _ => format!("sender #{sender_id}"),
        }
    }

    /// Record a dispatch attempt against the feed.
    pub fn log_dispatch(&self, request: &ActionRequest, outcome: &ActionOutcome) -> Result<()> {
        let sender_name = self.sender_name(request.sender_id);
        let status = if outcome.success { "success" } else { "failed" };
        let detail = if outcome.success {
            outcome.result_payload.as_deref().unwrap_or("")
        } else {
            outcome.detail.as_deref().unwrap_or("")
        };

        if outcome.success {
            tracing::info!(
                item = request.item_id,
                campaign = request.campaign_id,
                kind = %request.kind,
                sender = %sender_name,
                target = %request.target_url,
                "action dispatched"
            );
        } else {
            tracing::warn!(
                item = request.item_id,
                campaign = request.campaign_id,
                kind = %request.kind,
                sender = %sender_name,
                target = %request.target_url,
                detail,
                "action failed"
            );
        }

        let now = clock::local_now(self.config.utc_offset_minutes);
        self.store.log_activity(
            &NewActivity {
                kind: request.kind.as_str(),
                sender_id: Some(request.sender_id),
                sender_name: &sender_name,
                target_name: &request.target_name,
                target_url: &request.target_url,
                campaign_id: Some(request.campaign_id),
                status,
                detail,
            },
            now,
        )?;
        Ok(())
    }

    /// Record an item skipped by a gate (rate limit, cooldown).
    pub fn log_skip(&self, request: &ActionRequest, reason: &str) -> Result<()> {
        let sender_name = self.sender_name(request.sender_id);
        tracing::info!(
            item = request.item_id,
            campaign = request.campaign_id,
            kind = %request.kind,
            target = %request.target_url,
            reason,
            "action skipped"
        );
        let now = clock::local_now(self.config.utc_offset_minutes);
        self.store.log_activity(
            &NewActivity {
                kind: request.kind.as_str(),
                sender_id: Some(request.sender_id),
                sender_name: &sender_name,
                target_name: &request.target_name,
                target_url: &request.target_url,
                campaign_id: Some(request.campaign_id),
                status: "skipped",
                detail: reason,
            },
            now,
        )?;
        Ok(())
    }

    /// Record a campaign-level event (started, paused, cancelled, done).
    pub fn log_event(&self, campaign_id: i64, sender_id: i64, event: &str, detail: &str) -> Result<()> {
        let sender_name = self.sender_name(sender_id);
        tracing::info!(campaign = campaign_id, sender = %sender_name, detail, "{event}");
        let now = clock::local_now(self.config.utc_offset_minutes);
        self.store.log_activity(
            &NewActivity {
                kind: "campaign",
                sender_id: Some(sender_id),
                sender_name: &sender_name,
                target_name: "",
                target_url: "",
                campaign_id: Some(campaign_id),
                status: event,
                detail,
            },
            now,
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use paceline_core::types::ActionKind;

    #[test]
    fn test_dispatch_lands_in_feed() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let config = Arc::new(PacelineConfig { utc_offset_minutes: 0, ..Default::default() });
        let sender = store
            .add_sender("Avery", "avery@example.com", Utc::now().fixed_offset())
            .unwrap();
        let logger = ActivityLogger::new(store.clone(), config);

        let request = ActionRequest {
            item_id: 1,
            campaign_id: 2,
            sender_id: sender,
            kind: ActionKind::Like,
            target_name: "Post".into(),
            target_url: "https://example.com/p/1".into(),
            payload: String::new(),
        };
        logger.log_dispatch(&request, &ActionOutcome::success()).unwrap();
        logger
            .log_dispatch(&request, &ActionOutcome::failure("network down"))
            .unwrap();

        let feed = store.recent_activity(10).unwrap();
        assert_eq!(feed.len(), 2);
        // Newest first.
        assert_eq!(feed[0].status, "failed");
        assert_eq!(feed[0].detail, "network down");
        assert_eq!(feed[1].status, "success");
        assert_eq!(feed[1].sender_name, "Avery");
    }

    #[test]
    fn test_unknown_sender_gets_placeholder_name() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let config = Arc::new(PacelineConfig { utc_offset_minutes: 0, ..Default::default() });
        let logger = ActivityLogger::new(store.clone(), config);

        logger.log_event(7, 99, "started", "").unwrap();
        let feed = store.recent_activity(1).unwrap();
        assert_eq!(feed[0].sender_name, "sender #99");
    }
}
