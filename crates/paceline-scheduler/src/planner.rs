//! Weekly budget planner.
//!
//! Spreads a sender's remaining weekly allowance over the permitted
//! days left in the current week. Stateless: every call recomputes the
//! plan from the counters, so a missed day's budget flows forward on
//! its own.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use paceline_core::clock;
use paceline_core::error::Result;
use paceline_core::types::ActionKind;
use paceline_core::PacelineConfig;
use paceline_store::Store;

use crate::window::parse_days;

pub struct WeeklyPlanner {
    store: Arc<Store>,
    config: Arc<PacelineConfig>,
}

/// Spread `budget` over `days`, evenly plus a randomly placed
/// remainder, then nudge random pairs so the per-day numbers do not
/// look machine-flat. The total is preserved exactly and no day goes
/// negative.
pub fn distribute_budget<R: Rng>(
    rng: &mut R,
    days: &[NaiveDate],
    budget: u32,
) -> BTreeMap<NaiveDate, u32> {
    let mut plan: BTreeMap<NaiveDate, u32> = days.iter().map(|d| (*d, 0)).collect();
    if days.is_empty() || budget == 0 {
        return plan;
    }

    let base = budget / days.len() as u32;
    let remainder = budget % days.len() as u32;
    for count in plan.values_mut() {
        *count = base;
    }
    let mut extras: Vec<NaiveDate> = days.to_vec();
    extras.shuffle(rng);
    for day in extras.iter().take(remainder as usize) {
        if let Some(count) = plan.get_mut(day) {
            *count += 1;
        }
    }

    // Shift up to a third of a donor day to a random recipient, a few
    // times, so consecutive weeks never repeat the same shape.
    if days.len() >= 2 {
        for _ in 0..days.len() {
            let donor = days[rng.gen_range(0..days.len())];
            let recipient = days[rng.gen_range(0..days.len())];
            if donor == recipient {
                continue;
            }
            let available = plan.get(&donor).copied().unwrap_or(0) / 3;
            if available == 0 {
                continue;
            }
            let shift = rng.gen_range(1..=available);
            if let Some(count) = plan.get_mut(&donor) {
                *count -= shift;
            }
            if let Some(count) = plan.get_mut(&recipient) {
                *count += shift;
            }
        }
    }

    plan
}

impl WeeklyPlanner {
    pub fn new(store: Arc<Store>, config: Arc<PacelineConfig>) -> Self {
        Self { store, config }
    }

    /// The permitted days left in the current week, today included when
    /// today is permitted. An empty configured day set means every day.
    pub fn remaining_permitted_days(&self) -> Result<Vec<NaiveDate>> {
        let spec = match self.store.get_setting("work_days")? {
            Some(s) => s,
            None => self.config.work_window.days.clone(),
        };
        let permitted = parse_days(&spec);

        let today = clock::local_now(self.config.utc_offset_minutes).date_naive();
        let monday = clock::monday_of_week(today);
        let mut days = Vec::new();
        for i in 0..7 {
            let day = monday + Duration::days(i);
            if day < today {
                continue;
            }
            if permitted.is_empty() || permitted.contains(&day.weekday()) {
                days.push(day);
            }
        }
        Ok(days)
    }

    /// Plan the rest of the week for one sender and kind.
    pub fn plan_week(
        &self,
        sender_id: i64,
        kind: ActionKind,
        weekly_limit: u32,
    ) -> Result<BTreeMap<NaiveDate, u32>> {
        let monday = clock::monday_str(self.config.utc_offset_minutes);
        let used = self.store.weekly_count(&monday, sender_id, kind)?;
        let budget = weekly_limit.saturating_sub(used);
        let days = self.remaining_permitted_days()?;
        Ok(distribute_budget(&mut rand::thread_rng(), &days, budget))
    }

    /// Today's share of the weekly plan, zero when today is not a
    /// permitted day.
    pub fn today_budget(&self, sender_id: i64, kind: ActionKind, weekly_limit: u32) -> Result<u32> {
        let today = clock::local_now(self.config.utc_offset_minutes).date_naive();
        let plan = self.plan_week(sender_id, kind, weekly_limit)?;
        Ok(plan.get(&today).copied().unwrap_or(0))
    }
}
