//! Campaign lifecycle transitions.
//!
//! All status changes funnel through here so the guards live in one
//! place. The queue materializes on first start, not on create: a
//! draft holds no items, and targets added to the list before the
//! start still make it in.

use std::sync::Arc;

use paceline_core::clock;
use paceline_core::error::{PacelineError, Result};
use paceline_core::types::{ActionKind, CampaignStatus};
use paceline_core::PacelineConfig;
use paceline_store::{Campaign, NewActionItem, Store};

pub struct CampaignLifecycle {
    store: Arc<Store>,
    config: Arc<PacelineConfig>,
}

impl CampaignLifecycle {
    pub fn new(store: Arc<Store>, config: Arc<PacelineConfig>) -> Self {
        Self { store, config }
    }

    fn now(&self) -> chrono::DateTime<chrono::FixedOffset> {
        clock::local_now(self.config.utc_offset_minutes)
    }

    fn require(&self, id: i64) -> Result<Campaign> {
        self.store
            .get_campaign(id)?
            .ok_or(PacelineError::CampaignNotFound(id))
    }

    /// Create a draft campaign over an existing list and sender. The
    /// total is snapshotted from the list size at creation.
    pub fn create(
        &self,
        name: &str,
        list_id: i64,
        sender_id: i64,
        kind: ActionKind,
        note: Option<&str>,
    ) -> Result<i64> {
        self.store
            .get_sender(sender_id)?
            .ok_or(PacelineError::SenderNotFound(sender_id))?;
        self.store
            .get_list(list_id)?
            .ok_or(PacelineError::ListNotFound(list_id))?;
        let total = self.store.count_targets(list_id)?;
        let id = self
            .store
            .create_campaign(name, list_id, sender_id, kind, note, total, self.now())?;
        tracing::info!(campaign = id, name, kind = %kind, total, "campaign created");
        Ok(id)
    }

    /// Materialize the action queue from the target list, snapshotting
    /// name, url and the campaign note into each item. Idempotent even
    /// under concurrent starts: the store's insert transaction guards
    /// against a queue that already holds items.
    pub fn materialize_queue(&self, campaign_id: i64) -> Result<usize> {
        let campaign = self.require(campaign_id)?;
        let targets = self.store.list_targets(campaign.list_id)?;
        let items: Vec<NewActionItem> = targets
            .into_iter()
            .map(|t| NewActionItem {
                target_id: t.id,
                target_name: t.name,
                target_url: t.url,
                payload: campaign.note.clone(),
            })
            .collect();
        let n = self
            .store
            .enqueue_items(campaign_id, campaign.sender_id, campaign.kind, &items, self.now())?;
        if n > 0 {
            tracing::info!(campaign = campaign_id, items = n, "queue materialized");
        }
        Ok(n)
    }

    /// `draft|paused → active` (re-activating an active campaign is a
    /// no-op). Materializes the queue on first start.
    pub fn activate(&self, campaign_id: i64) -> Result<()> {
        let campaign = self.require(campaign_id)?;
        if campaign.status.is_terminal() {
            return Err(PacelineError::InvalidTransition(format!(
                "campaign {campaign_id} is {} and cannot be started",
                campaign.status
            )));
        }
        self.materialize_queue(campaign_id)?;
        self.store.activate_campaign(campaign_id, self.now())?;
        Ok(())
    }

    /// `active → paused`.
    pub fn pause(&self, campaign_id: i64) -> Result<()> {
        let campaign = self.require(campaign_id)?;
        if !self.store.pause_campaign_row(campaign_id)? {
            return Err(PacelineError::InvalidTransition(format!(
                "campaign {campaign_id} is {} and cannot be paused",
                campaign.status
            )));
        }
        Ok(())
    }

    /// Cancel a campaign: terminal status, every remaining item bulk-
    /// skipped and counted. Returns how many items were skipped.
    pub fn cancel(&self, campaign_id: i64) -> Result<u32> {
        let campaign = self.require(campaign_id)?;
        let now = self.now();
        if !self.store.cancel_campaign_row(campaign_id, now)? {
            return Err(PacelineError::InvalidTransition(format!(
                "campaign {campaign_id} is {} and cannot be cancelled",
                campaign.status
            )));
        }
        let skipped = self.store.skip_remaining_items(campaign_id, now)?;
        if skipped > 0 {
            self.store.record_skips(campaign_id, skipped)?;
        }
        tracing::info!(campaign = campaign_id, skipped, "campaign cancelled");
        Ok(skipped)
    }

    /// `active → completed`, the queue-exhausted path.
    pub fn complete(&self, campaign_id: i64) -> Result<()> {
        self.store.complete_campaign_row(campaign_id, self.now())?;
        Ok(())
    }

    pub fn status(&self, campaign_id: i64) -> Result<CampaignStatus> {
        Ok(self.require(campaign_id)?.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use paceline_core::types::ItemStatus;

    fn setup() -> (Arc<Store>, CampaignLifecycle) {
        let store = Arc::new(Store::open_in_memory().unwrap());
        let config = Arc::new(PacelineConfig { utc_offset_minutes: 0, ..Default::default() });
        let lifecycle = CampaignLifecycle::new(store.clone(), config);
        (store, lifecycle)
    }

    fn seed(store: &Store, targets: usize) -> (i64, i64) {
        let now = Utc::now().fixed_offset();
        let sender = store.add_sender("S", "s@example.com", now).unwrap();
        let list = store.create_list("L", "", now).unwrap();
        for i in 0..targets {
            store
                .add_target(list, &format!("T{i}"), &format!("https://example.com/t/{i}"), now)
                .unwrap();
        }
        (sender, list)
    }

    #[test]
    fn test_create_snapshots_total() {
        let (store, lifecycle) = setup();
        let (sender, list) = seed(&store, 3);
        let id = lifecycle.create("C", list, sender, ActionKind::Like, None).unwrap();
        let campaign = store.get_campaign(id).unwrap().unwrap();
        assert_eq!(campaign.status, CampaignStatus::Draft);
        assert_eq!(campaign.total, 3);
        // Draft holds no items yet.
        assert!(store.items_for_campaign(id).unwrap().is_empty());
    }

    #[test]
    fn test_create_rejects_missing_refs() {
        let (store, lifecycle) = setup();
        let (sender, list) = seed(&store, 1);
        assert!(matches!(
            lifecycle.create("C", 99, sender, ActionKind::Like, None),
            Err(PacelineError::ListNotFound(99))
        ));
        assert!(matches!(
            lifecycle.create("C", list, 99, ActionKind::Like, None),
            Err(PacelineError::SenderNotFound(99))
        ));
    }

    #[test]
    fn test_activate_materializes_once() {
        let (store, lifecycle) = setup();
        let (sender, list) = seed(&store, 2);
        let id = lifecycle
            .create("C", list, sender, ActionKind::Comment, Some("nice post"))
            .unwrap();

        lifecycle.activate(id).unwrap();
        let items = store.items_for_campaign(id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].payload.as_deref(), Some("nice post"));

        // Pause and restart: no duplicate items.
        lifecycle.pause(id).unwrap();
        lifecycle.activate(id).unwrap();
        assert_eq!(store.items_for_campaign(id).unwrap().len(), 2);
        assert_eq!(lifecycle.status(id).unwrap(), CampaignStatus::Active);
    }

    #[test]
    fn test_cancel_skips_remaining() {
        let (store, lifecycle) = setup();
        let (sender, list) = seed(&store, 4);
        let id = lifecycle.create("C", list, sender, ActionKind::Like, None).unwrap();
        lifecycle.activate(id).unwrap();

        let skipped = lifecycle.cancel(id).unwrap();
        assert_eq!(skipped, 4);
        let campaign = store.get_campaign(id).unwrap().unwrap();
        assert_eq!(campaign.status, CampaignStatus::Cancelled);
        assert_eq!(campaign.skipped, 4);
        assert_eq!(campaign.processed, 4);
        assert!(store
            .items_for_campaign(id)
            .unwrap()
            .iter()
            .all(|i| i.status == ItemStatus::Skipped));
    }

    #[test]
    fn test_terminal_guards() {
        let (store, lifecycle) = setup();
        let (sender, list) = seed(&store, 1);
        let id = lifecycle.create("C", list, sender, ActionKind::Like, None).unwrap();
        lifecycle.activate(id).unwrap();
        lifecycle.cancel(id).unwrap();

        assert!(matches!(
            lifecycle.activate(id),
            Err(PacelineError::InvalidTransition(_))
        ));
        assert!(matches!(lifecycle.cancel(id), Err(PacelineError::InvalidTransition(_))));
        assert!(matches!(lifecycle.pause(id), Err(PacelineError::InvalidTransition(_))));
    }
}
