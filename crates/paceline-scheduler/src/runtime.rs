//! Scheduler runtime — one tokio task per active campaign.
//!
//! Workers are strictly sequential within a campaign and talk to the
//! outside only through the store and the actuator set. Control flows
//! over a `watch` channel: pause blocks the worker at its next
//! checkpoint, cancel stops it, and both are observed on every wake
//! from a sleep.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};

use paceline_core::clock;
use paceline_core::error::{PacelineError, Result};
use paceline_core::types::{CampaignStatus, ItemStatus, SenderStatus};
use paceline_core::PacelineConfig;
use paceline_store::{ActionItem, Campaign, Store};

use crate::activity::ActivityLogger;
use crate::actuator::{ActionOutcome, ActionRequest, ActuatorSet};
use crate::cooldown::CooldownRegistry;
use crate::lifecycle::CampaignLifecycle;
use crate::limiter::RateLimiter;
use crate::pacing::Pacing;
use crate::window::ExecutionWindow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerSignal {
    Run,
    Pause,
    Cancel,
}

/// What a suspension point tells the worker loop to do next.
enum Flow {
    Continue,
    Stop,
}

struct WorkerHandle {
    signal: watch::Sender<WorkerSignal>,
    join: JoinHandle<()>,
}

/// Block while the signal reads `Pause`; resolve on `Run` or `Cancel`.
/// A dropped sender counts as cancel.
async fn checkpoint(rx: &mut watch::Receiver<WorkerSignal>) -> Flow {
    loop {
        match *rx.borrow_and_update() {
            WorkerSignal::Run => return Flow::Continue,
            WorkerSignal::Cancel => return Flow::Stop,
            WorkerSignal::Pause => {}
        }
        if rx.changed().await.is_err() {
            return Flow::Stop;
        }
    }
}

/// Sleep until the deadline, waking early on any signal change. A
/// pause observed mid-sleep blocks at the checkpoint and then resumes
/// toward the original deadline.
async fn interruptible_sleep(rx: &mut watch::Receiver<WorkerSignal>, dur: Duration) -> Flow {
    let deadline = Instant::now() + dur;
    loop {
        tokio::select! {
            _ = sleep_until(deadline) => return Flow::Continue,
            changed = rx.changed() => {
                if changed.is_err() {
                    return Flow::Stop;
                }
                if let Flow::Stop = checkpoint(rx).await {
                    return Flow::Stop;
                }
            }
        }
    }
}

/// Cheap-clone handle over the shared runtime state; workers hold
/// their own clone.
#[derive(Clone)]
pub struct SchedulerRuntime {
    inner: Arc<RuntimeInner>,
}

struct RuntimeInner {
    store: Arc<Store>,
    config: Arc<PacelineConfig>,
    actuators: ActuatorSet,
    limiter: RateLimiter,
    cooldown: CooldownRegistry,
    window: ExecutionWindow,
    pacing: Pacing,
    lifecycle: CampaignLifecycle,
    activity: ActivityLogger,
    workers: Mutex<HashMap<i64, WorkerHandle>>,
}

impl SchedulerRuntime {
    pub fn new(store: Arc<Store>, config: Arc<PacelineConfig>, actuators: ActuatorSet) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                limiter: RateLimiter::new(store.clone(), config.clone()),
                cooldown: CooldownRegistry::new(store.clone(), config.clone()),
                window: ExecutionWindow::new(store.clone(), config.clone()),
                pacing: Pacing::new(store.clone(), config.clone()),
                lifecycle: CampaignLifecycle::new(store.clone(), config.clone()),
                activity: ActivityLogger::new(store.clone(), config.clone()),
                store,
                config,
                actuators,
                workers: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn lifecycle(&self) -> &CampaignLifecycle {
        &self.inner.lifecycle
    }

    fn now(&self) -> chrono::DateTime<chrono::FixedOffset> {
        clock::local_now(self.inner.config.utc_offset_minutes)
    }

    /// Activate the campaign and ensure a worker is driving it. Called
    /// on a campaign that already has a live worker this just signals
    /// `Run` (the resume path).
    pub async fn start_campaign(&self, campaign_id: i64) -> Result<()> {
        self.inner.lifecycle.activate(campaign_id)?;
        let campaign = self
            .inner
            .store
            .get_campaign(campaign_id)?
            .ok_or(PacelineError::CampaignNotFound(campaign_id))?;

        let mut workers = self.inner.workers.lock().await;
        if let Some(handle) = workers.get(&campaign_id) {
            if !handle.join.is_finished() {
                let _ = handle.signal.send(WorkerSignal::Run);
                self.inner.activity.log_event(campaign_id, campaign.sender_id, "resumed", "")?;
                return Ok(());
            }
        }
        let (tx, rx) = watch::channel(WorkerSignal::Run);
        let join = tokio::spawn(self.clone().run_worker(campaign_id, rx));
        workers.insert(campaign_id, WorkerHandle { signal: tx, join });
        self.inner.activity.log_event(campaign_id, campaign.sender_id, "started", "")?;
        Ok(())
    }

    /// Pause: the row flips immediately, the worker blocks at its next
    /// checkpoint. A mid-dispatch item still finishes and is recorded.
    pub async fn pause_campaign(&self, campaign_id: i64) -> Result<()> {
        self.inner.lifecycle.pause(campaign_id)?;
        let workers = self.inner.workers.lock().await;
        if let Some(handle) = workers.get(&campaign_id) {
            let _ = handle.signal.send(WorkerSignal::Pause);
        }
        if let Some(campaign) = self.inner.store.get_campaign(campaign_id)? {
            self.inner.activity.log_event(campaign_id, campaign.sender_id, "paused", "")?;
        }
        Ok(())
    }

    /// Cancel: terminal row status, remaining items bulk-skipped, the
    /// worker stops at its next safe point. Returns the skip count.
    pub async fn cancel_campaign(&self, campaign_id: i64) -> Result<u32> {
        let skipped = self.inner.lifecycle.cancel(campaign_id)?;
        let workers = self.inner.workers.lock().await;
        if let Some(handle) = workers.get(&campaign_id) {
            let _ = handle.signal.send(WorkerSignal::Cancel);
        }
        if let Some(campaign) = self.inner.store.get_campaign(campaign_id)? {
            self.inner.activity.log_event(
                campaign_id,
                campaign.sender_id,
                "cancelled",
                &format!("{skipped} items skipped"),
            )?;
        }
        Ok(skipped)
    }

    /// Startup reconciliation: re-spawn a worker for every campaign
    /// left `active`. Items stuck `running` from a previous crash are
    /// reported and left alone.
    pub async fn resume_active_campaigns(&self) -> Result<usize> {
        let ids = self.inner.store.campaign_ids_with_status(CampaignStatus::Active)?;
        let mut resumed = 0;
        for id in ids {
            let stuck = self.inner.store.running_items_count(id)?;
            if stuck > 0 {
                tracing::warn!(
                    campaign = id,
                    stuck,
                    "items left running by a previous shutdown, not re-running them"
                );
            }
            let mut workers = self.inner.workers.lock().await;
            let alive = workers.get(&id).is_some_and(|h| !h.join.is_finished());
            if !alive {
                let (tx, rx) = watch::channel(WorkerSignal::Run);
                let join = tokio::spawn(self.clone().run_worker(id, rx));
                workers.insert(id, WorkerHandle { signal: tx, join });
                resumed += 1;
            }
        }
        if resumed > 0 {
            tracing::info!(resumed, "resumed active campaigns");
        }
        Ok(resumed)
    }

    /// Campaign ids with a live worker task.
    pub async fn running_campaigns(&self) -> Vec<i64> {
        let workers = self.inner.workers.lock().await;
        let mut ids: Vec<i64> = workers
            .iter()
            .filter(|(_, h)| !h.join.is_finished())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Wait for a campaign's worker to finish, if one exists.
    pub async fn wait_for(&self, campaign_id: i64) {
        let handle = {
            let mut workers = self.inner.workers.lock().await;
            workers.remove(&campaign_id)
        };
        if let Some(handle) = handle {
            let _ = handle.join.await;
        }
    }

    async fn run_worker(self, campaign_id: i64, mut rx: watch::Receiver<WorkerSignal>) {
        tracing::debug!(campaign = campaign_id, "worker started");
        if let Err(err) = self.drive_campaign(campaign_id, &mut rx).await {
            tracing::error!(campaign = campaign_id, %err, "worker error, pausing campaign");
            if let Err(err) = self.inner.store.pause_campaign_row(campaign_id) {
                tracing::error!(campaign = campaign_id, %err, "could not pause after worker error");
            }
        }
        tracing::debug!(campaign = campaign_id, "worker stopped");
    }

    async fn drive_campaign(
        &self,
        campaign_id: i64,
        rx: &mut watch::Receiver<WorkerSignal>,
    ) -> Result<()> {
        loop {
            if let Flow::Stop = checkpoint(rx).await {
                return Ok(());
            }

            let campaign = match self.inner.store.get_campaign(campaign_id)? {
                Some(c) => c,
                None => return Ok(()),
            };
            if campaign.status != CampaignStatus::Active {
                return Ok(());
            }

            if !self.inner.window.is_open()? {
                tracing::debug!(campaign = campaign_id, "outside work window, idling");
                if let Flow::Stop = interruptible_sleep(rx, self.inner.window.poll_interval()).await {
                    return Ok(());
                }
                continue;
            }

            let sender = self
                .inner
                .store
                .get_sender(campaign.sender_id)?
                .ok_or(PacelineError::SenderNotFound(campaign.sender_id))?;
            if sender.status != SenderStatus::Active {
                tracing::warn!(
                    campaign = campaign_id,
                    sender = campaign.sender_id,
                    status = %sender.status,
                    "sender not active, pausing campaign"
                );
                self.inner.store.pause_campaign_row(campaign_id)?;
                return Ok(());
            }

            let pending = self.inner.store.pending_items(campaign_id)?;
            let Some(item) = pending.into_iter().next() else {
                self.inner.store.complete_campaign_row(campaign_id, self.now())?;
                self.inner.activity
                    .log_event(campaign_id, campaign.sender_id, "completed", "queue exhausted")?;
                return Ok(());
            };

            let dispatched = self.process_item(&campaign, &item).await?;
            if dispatched {
                let delay = self.inner.pacing.delay_for(campaign.kind)?;
                if let Flow::Stop = interruptible_sleep(rx, delay).await {
                    return Ok(());
                }
            }
            // Gate skips take no delay: move straight to the next item.
        }
    }

    /// Run one item through the gates and, when they pass, the
    /// actuator. Returns true when the item was actually dispatched.
    async fn process_item(&self, campaign: &Campaign, item: &ActionItem) -> Result<bool> {
        let request = ActionRequest {
            item_id: item.id,
            campaign_id: campaign.id,
            sender_id: item.sender_id,
            kind: item.kind,
            target_name: item.target_name.clone(),
            target_url: item.target_url.clone(),
            payload: item.payload.clone().unwrap_or_default(),
        };

        let decision = self.inner.limiter.check(item.sender_id, item.kind)?;
        if !decision.allowed {
            if self.inner.store
                .complete_item(item.id, ItemStatus::Skipped, self.now(), Some(&decision.reason))?
            {
                self.inner.store.record_skip(campaign.id)?;
                self.inner.activity.log_skip(&request, &decision.reason)?;
            }
            return Ok(false);
        }

        if self.inner.cooldown.is_on_cooldown(&item.target_url, item.kind)? {
            let reason = format!("target on {} cooldown", item.kind);
            if self.inner.store
                .complete_item(item.id, ItemStatus::Skipped, self.now(), Some(&reason))?
            {
                self.inner.store.record_skip(campaign.id)?;
                self.inner.activity.log_skip(&request, &reason)?;
            }
            return Ok(false);
        }

        // Claimed before dispatch so a crash mid-action never re-runs it.
        // A failed claim means a concurrent cancel skipped the row between
        // the pending scan and here: the item is already counted, so the
        // actuator must not see it.
        if !self.inner.store.mark_item_running(item.id)? {
            tracing::debug!(item = item.id, "item claimed away before dispatch");
            return Ok(false);
        }

        let outcome = match self.inner.actuators.get(item.kind) {
            Some(actuator) => actuator.perform(&request).await,
            None => ActionOutcome::failure(format!("no actuator registered for {}", item.kind)),
        };

        let now = self.now();
        if outcome.success {
            self.inner.store.complete_item(item.id, ItemStatus::Done, now, None)?;
            self.inner.store.record_success(campaign.id)?;
            self.inner.limiter.increment(item.sender_id, item.kind)?;
            self.inner.cooldown.record(&item.target_url, item.sender_id, item.kind)?;
            self.inner.store.touch_target(item.target_id, item.kind, now)?;
        } else {
            self.inner.store
                .complete_item(item.id, ItemStatus::Failed, now, outcome.detail.as_deref())?;
            self.inner.store.record_failure(campaign.id)?;
        }
        self.inner.activity.log_dispatch(&request, &outcome)?;
        Ok(true)
    }
}
