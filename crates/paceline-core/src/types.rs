//! Domain vocabulary — action kinds and lifecycle statuses.
//!
//! These are closed enums on purpose: the scheduler never branches on
//! free-form strings, and the store round-trips everything through
//! `as_str`/`FromStr` so a typo surfaces as an error instead of a
//! silently dead row.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PacelineError;

/// The kind of engagement action a campaign performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Like,
    Comment,
    Connect,
}

impl ActionKind {
    pub const ALL: [ActionKind; 3] = [ActionKind::Like, ActionKind::Comment, ActionKind::Connect];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Like => "like",
            ActionKind::Comment => "comment",
            ActionKind::Connect => "connect",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = PacelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ActionKind::Like),
            "comment" => Ok(ActionKind::Comment),
            "connect" => Ok(ActionKind::Connect),
            other => Err(PacelineError::Invalid(format!("unknown action kind '{other}'"))),
        }
    }
}

/// Sender account lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderStatus {
    Active,
    Paused,
    Disabled,
}

impl SenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SenderStatus::Active => "active",
            SenderStatus::Paused => "paused",
            SenderStatus::Disabled => "disabled",
        }
    }
}

impl fmt::Display for SenderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SenderStatus {
    type Err = PacelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(SenderStatus::Active),
            "paused" => Ok(SenderStatus::Paused),
            "disabled" => Ok(SenderStatus::Disabled),
            other => Err(PacelineError::Invalid(format!("unknown sender status '{other}'"))),
        }
    }
}

/// Campaign lifecycle: `draft → active → {paused, completed, cancelled}`.
/// `completed` and `cancelled` are terminal; `paused` is resumable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Draft => "draft",
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Completed => "completed",
            CampaignStatus::Cancelled => "cancelled",
        }
    }

    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Completed | CampaignStatus::Cancelled)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CampaignStatus {
    type Err = PacelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(CampaignStatus::Draft),
            "active" => Ok(CampaignStatus::Active),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            "cancelled" => Ok(CampaignStatus::Cancelled),
            other => Err(PacelineError::Invalid(format!("unknown campaign status '{other}'"))),
        }
    }
}

/// Queued action item lifecycle: `pending → running → {done, failed, skipped}`.
/// `scheduled` is an optional pre-running state used by external planners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Scheduled,
    Running,
    Done,
    Failed,
    Skipped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Scheduled => "scheduled",
            ItemStatus::Running => "running",
            ItemStatus::Done => "done",
            ItemStatus::Failed => "failed",
            ItemStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Done | ItemStatus::Failed | ItemStatus::Skipped)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = PacelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ItemStatus::Pending),
            "scheduled" => Ok(ItemStatus::Scheduled),
            "running" => Ok(ItemStatus::Running),
            "done" => Ok(ItemStatus::Done),
            "failed" => Ok(ItemStatus::Failed),
            "skipped" => Ok(ItemStatus::Skipped),
            other => Err(PacelineError::Invalid(format!("unknown item status '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_kind_round_trip() {
        for kind in ActionKind::ALL {
            assert_eq!(kind.as_str().parse::<ActionKind>().unwrap(), kind);
        }
        assert!("poke".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(CampaignStatus::Completed.is_terminal());
        assert!(CampaignStatus::Cancelled.is_terminal());
        assert!(!CampaignStatus::Paused.is_terminal());
        assert!(ItemStatus::Skipped.is_terminal());
        assert!(!ItemStatus::Running.is_terminal());
    }

    #[test]
    fn test_status_strings_round_trip() {
        for s in ["draft", "active", "paused", "completed", "cancelled"] {
            assert_eq!(s.parse::<CampaignStatus>().unwrap().as_str(), s);
        }
        for s in ["pending", "scheduled", "running", "done", "failed", "skipped"] {
            assert_eq!(s.parse::<ItemStatus>().unwrap().as_str(), s);
        }
    }
}
