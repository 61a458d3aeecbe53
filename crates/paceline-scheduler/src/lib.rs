//! # Paceline Scheduler
//!
//! The execution core: one lightweight tokio task per active campaign,
//! each draining its action queue item by item through a fixed gauntlet
//! of gates before anything reaches the actuator.
//!
//! ## Per-item pipeline
//! ```text
//! checkpoint (pause/cancel)
//!   → wait for the execution window (work hours + weekdays)
//!   → rate limit (daily/weekly caps, ramp-up scaling)   — deny ⇒ skip
//!   → cross-sender cooldown on the target               — deny ⇒ skip
//!   → mark running, dispatch to the Actuator
//!   → record outcome (counters, cooldown entry, activity log)
//!   → human-paced random delay
//! ```
//!
//! Workers are strictly sequential within a campaign and run in parallel
//! across campaigns; all shared state (counters, cooldown registry)
//! lives in the store behind atomic keyed upserts. Pause is cooperative,
//! cancel stops at the next safe point, and restart recovery re-launches
//! workers for campaigns left `active` (items stuck `running` are left
//! for operator reconciliation, never re-run).

pub mod activity;
pub mod actuator;
pub mod cooldown;
pub mod lifecycle;
pub mod limiter;
pub mod pacing;
pub mod planner;
pub mod runtime;
pub mod window;

pub use activity::ActivityLogger;
pub use actuator::{ActionOutcome, ActionRequest, Actuator, ActuatorSet, DryRunActuator};
pub use cooldown::CooldownRegistry;
pub use lifecycle::CampaignLifecycle;
pub use limiter::{LimitDecision, RateLimiter};
pub use pacing::Pacing;
pub use planner::WeeklyPlanner;
pub use runtime::{SchedulerRuntime, WorkerSignal};
pub use window::ExecutionWindow;
