//! Persisted record types.

use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;

use paceline_core::types::{ActionKind, CampaignStatus, ItemStatus, SenderStatus};

/// Parse a stored RFC 3339 timestamp, falling back to now on corruption.
pub(crate) fn parse_ts(s: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(s).unwrap_or_else(|_| Utc::now().fixed_offset())
}

pub(crate) fn parse_ts_opt(s: Option<String>) -> Option<DateTime<FixedOffset>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
}

/// An actor account on whose behalf actions are performed.
///
/// The six `*_limit` columns are per-sender cap overrides; `None` means
/// the sender inherits the settings/config default for that kind.
#[derive(Debug, Clone, Serialize)]
pub struct Sender {
    pub id: i64,
    pub name: String,
    /// Opaque reference to the external account (email, profile handle, ...).
    pub account_ref: String,
    pub status: SenderStatus,
    pub daily_like_limit: Option<u32>,
    pub weekly_like_limit: Option<u32>,
    pub daily_comment_limit: Option<u32>,
    pub weekly_comment_limit: Option<u32>,
    pub daily_connect_limit: Option<u32>,
    pub weekly_connect_limit: Option<u32>,
    pub created_at: DateTime<FixedOffset>,
}

impl Sender {
    /// Per-sender daily cap override for `kind`, if any.
    pub fn daily_cap(&self, kind: ActionKind) -> Option<u32> {
        match kind {
            ActionKind::Like => self.daily_like_limit,
            ActionKind::Comment => self.daily_comment_limit,
            ActionKind::Connect => self.daily_connect_limit,
        }
    }

    /// Per-sender weekly cap override for `kind`, if any.
    pub fn weekly_cap(&self, kind: ActionKind) -> Option<u32> {
        match kind {
            ActionKind::Like => self.weekly_like_limit,
            ActionKind::Comment => self.weekly_comment_limit,
            ActionKind::Connect => self.weekly_connect_limit,
        }
    }
}

/// A named list of targets.
#[derive(Debug, Clone, Serialize)]
pub struct TargetList {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<FixedOffset>,
}

/// A single target inside a list.
#[derive(Debug, Clone, Serialize)]
pub struct Target {
    pub id: i64,
    pub list_id: i64,
    pub name: String,
    pub url: String,
    pub is_liked: bool,
    pub is_commented: bool,
    pub is_connected: bool,
    pub last_action_at: Option<DateTime<FixedOffset>>,
}

/// A batch job: one action kind, one sender, one target list.
#[derive(Debug, Clone, Serialize)]
pub struct Campaign {
    pub id: i64,
    pub name: String,
    pub list_id: i64,
    pub sender_id: i64,
    pub kind: ActionKind,
    pub status: CampaignStatus,
    /// Optional per-item payload (e.g. a connection note), snapshotted
    /// into every action item when the campaign starts.
    pub note: Option<String>,
    pub total: u32,
    pub processed: u32,
    pub successful: u32,
    pub failed: u32,
    pub skipped: u32,
    pub created_at: DateTime<FixedOffset>,
    pub started_at: Option<DateTime<FixedOffset>>,
    pub completed_at: Option<DateTime<FixedOffset>>,
}

/// One queued unit of work.
#[derive(Debug, Clone, Serialize)]
pub struct ActionItem {
    pub id: i64,
    pub campaign_id: i64,
    pub target_id: i64,
    pub sender_id: i64,
    pub kind: ActionKind,
    pub status: ItemStatus,
    pub target_name: String,
    pub target_url: String,
    pub payload: Option<String>,
    pub completed_at: Option<DateTime<FixedOffset>>,
    pub error_detail: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

/// Input for bulk queue creation when a campaign starts.
#[derive(Debug, Clone)]
pub struct NewActionItem {
    pub target_id: i64,
    pub target_name: String,
    pub target_url: String,
    pub payload: Option<String>,
}

/// Today's per-kind counts for one sender.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct DayCounts {
    pub likes: u32,
    pub comments: u32,
    pub connects: u32,
}

/// A cross-sender cooldown entry.
#[derive(Debug, Clone, Serialize)]
pub struct CooldownEntry {
    pub target_url: String,
    pub sender_id: i64,
    pub kind: ActionKind,
    pub acted_at: DateTime<FixedOffset>,
    pub cooldown_until: DateTime<FixedOffset>,
}

/// Append-only audit row.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityRecord {
    pub id: i64,
    pub kind: String,
    pub sender_id: Option<i64>,
    pub sender_name: String,
    pub target_name: String,
    pub target_url: String,
    pub campaign_id: Option<i64>,
    pub status: String,
    pub detail: String,
    pub created_at: DateTime<FixedOffset>,
}

/// Input for a new activity row.
#[derive(Debug, Clone)]
pub struct NewActivity<'a> {
    pub kind: &'a str,
    pub sender_id: Option<i64>,
    pub sender_name: &'a str,
    pub target_name: &'a str,
    pub target_url: &'a str,
    pub campaign_id: Option<i64>,
    pub status: &'a str,
    pub detail: &'a str,
}
