//! Paceline configuration system.
//!
//! File-backed defaults loaded from `~/.paceline/config.toml`. Runtime
//! overrides live in the store's `settings` table and win over anything
//! here — gating components re-read them on every check, so operator
//! edits take effect on the next item without a restart.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PacelineError, Result};
use crate::types::ActionKind;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacelineConfig {
    /// Fixed UTC offset, in minutes, of the operating time zone.
    /// All work-hour and calendar-day decisions are made in this zone.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub work_window: WorkWindowConfig,
    #[serde(default)]
    pub ramp_up: RampUpConfig,
    /// Cross-sender cooldown on repeat targets, in hours.
    #[serde(default = "default_cooldown_hours")]
    pub cooldown_hours: i64,
    #[serde(default)]
    pub pacing: PacingConfig,
}

// IST (+5:30).
fn default_utc_offset_minutes() -> i32 { 330 }
fn default_cooldown_hours() -> i64 { 72 }

impl Default for PacelineConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: default_utc_offset_minutes(),
            limits: LimitsConfig::default(),
            work_window: WorkWindowConfig::default(),
            ramp_up: RampUpConfig::default(),
            cooldown_hours: default_cooldown_hours(),
            pacing: PacingConfig::default(),
        }
    }
}

impl PacelineConfig {
    /// Load config from the default path (~/.paceline/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PacelineError::Config(format!("failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PacelineError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PacelineError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Paceline home directory (~/.paceline).
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".paceline")
    }

    /// Default database path (~/.paceline/paceline.db).
    pub fn default_db_path() -> PathBuf {
        Self::home_dir().join("paceline.db")
    }
}

/// Per-action-kind caps and pacing delay bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLimits {
    pub daily: u32,
    pub weekly: u32,
    /// Minimum delay between actions of this kind, in seconds.
    pub min_delay_secs: u64,
    /// Maximum delay between actions of this kind, in seconds.
    pub max_delay_secs: u64,
}

/// Default caps per action kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_like_limits")]
    pub like: ActionLimits,
    #[serde(default = "default_comment_limits")]
    pub comment: ActionLimits,
    #[serde(default = "default_connect_limits")]
    pub connect: ActionLimits,
}

fn default_like_limits() -> ActionLimits {
    ActionLimits { daily: 100, weekly: 300, min_delay_secs: 240, max_delay_secs: 840 }
}
fn default_comment_limits() -> ActionLimits {
    ActionLimits { daily: 50, weekly: 200, min_delay_secs: 480, max_delay_secs: 1320 }
}
fn default_connect_limits() -> ActionLimits {
    ActionLimits { daily: 25, weekly: 100, min_delay_secs: 600, max_delay_secs: 1500 }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            like: default_like_limits(),
            comment: default_comment_limits(),
            connect: default_connect_limits(),
        }
    }
}

impl LimitsConfig {
    pub fn for_kind(&self, kind: ActionKind) -> &ActionLimits {
        match kind {
            ActionKind::Like => &self.like,
            ActionKind::Comment => &self.comment,
            ActionKind::Connect => &self.connect,
        }
    }
}

/// Permitted execution window: hours and weekdays, in the configured zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkWindowConfig {
    #[serde(default = "default_start_hour")]
    pub start_hour: u32,
    #[serde(default = "default_end_hour")]
    pub end_hour: u32,
    /// Comma-separated day abbreviations: "mon,tue,wed,thu,fri".
    #[serde(default = "default_work_days")]
    pub days: String,
    /// How long a worker sleeps before re-checking a closed window.
    #[serde(default = "default_poll_secs")]
    pub poll_secs: u64,
}

fn default_start_hour() -> u32 { 9 }
fn default_end_hour() -> u32 { 18 }
fn default_work_days() -> String { "mon,tue,wed,thu,fri".to_string() }
fn default_poll_secs() -> u64 { 900 }

impl Default for WorkWindowConfig {
    fn default() -> Self {
        Self {
            start_hour: default_start_hour(),
            end_hour: default_end_hour(),
            days: default_work_days(),
            poll_secs: default_poll_secs(),
        }
    }
}

/// Temporary cap reduction for freshly-created senders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RampUpConfig {
    /// Senders younger than this many weeks get scaled-down caps.
    #[serde(default = "default_ramp_weeks")]
    pub weeks: u32,
    /// Percentage of the full caps that applies during ramp-up.
    #[serde(default = "default_ramp_percentage")]
    pub percentage: u32,
}

fn default_ramp_weeks() -> u32 { 2 }
fn default_ramp_percentage() -> u32 { 30 }

impl Default for RampUpConfig {
    fn default() -> Self {
        Self { weeks: default_ramp_weeks(), percentage: default_ramp_percentage() }
    }
}

/// Human-pacing knobs for the inter-action delay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacingConfig {
    /// Probability of tacking an extra "think" pause onto a delay.
    #[serde(default = "default_extra_pause_probability")]
    pub extra_pause_probability: f64,
    #[serde(default = "default_extra_pause_min_secs")]
    pub extra_pause_min_secs: u64,
    #[serde(default = "default_extra_pause_max_secs")]
    pub extra_pause_max_secs: u64,
}

fn default_extra_pause_probability() -> f64 { 0.2 }
fn default_extra_pause_min_secs() -> u64 { 60 }
fn default_extra_pause_max_secs() -> u64 { 180 }

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            extra_pause_probability: default_extra_pause_probability(),
            extra_pause_min_secs: default_extra_pause_min_secs(),
            extra_pause_max_secs: default_extra_pause_max_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PacelineConfig::default();
        assert_eq!(config.utc_offset_minutes, 330);
        assert_eq!(config.limits.like.daily, 100);
        assert_eq!(config.limits.comment.weekly, 200);
        assert_eq!(config.work_window.start_hour, 9);
        assert_eq!(config.ramp_up.percentage, 30);
        assert_eq!(config.cooldown_hours, 72);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: PacelineConfig = toml::from_str(
            r#"
            utc_offset_minutes = 0

            [limits.like]
            daily = 5
            weekly = 20
            min_delay_secs = 1
            max_delay_secs = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.limits.like.daily, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.limits.comment.daily, 50);
        assert_eq!(config.work_window.end_hour, 18);
    }

    #[test]
    fn test_for_kind() {
        let limits = LimitsConfig::default();
        assert_eq!(limits.for_kind(ActionKind::Connect).daily, 25);
        assert_eq!(limits.for_kind(ActionKind::Like).min_delay_secs, 240);
    }
}
