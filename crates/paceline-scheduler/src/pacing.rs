//! Human-pattern delays between actions.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

use paceline_core::config::PacingConfig;
use paceline_core::error::Result;
use paceline_core::types::ActionKind;
use paceline_core::PacelineConfig;
use paceline_store::Store;

pub struct Pacing {
    store: Arc<Store>,
    config: Arc<PacelineConfig>,
}

/// Uniform base delay in [min, max] plus an occasional extra pause.
/// Inverted bounds are normalized rather than rejected.
pub fn sample_delay<R: Rng>(
    rng: &mut R,
    min_secs: u64,
    max_secs: u64,
    pacing: &PacingConfig,
) -> Duration {
    let (lo, hi) = if min_secs <= max_secs { (min_secs, max_secs) } else { (max_secs, min_secs) };
    let mut secs = rng.gen_range(lo..=hi);

    let prob = pacing.extra_pause_probability.clamp(0.0, 1.0);
    if prob > 0.0 && rng.gen_bool(prob) {
        let (plo, phi) = if pacing.extra_pause_min_secs <= pacing.extra_pause_max_secs {
            (pacing.extra_pause_min_secs, pacing.extra_pause_max_secs)
        } else {
            (pacing.extra_pause_max_secs, pacing.extra_pause_min_secs)
        };
        secs += rng.gen_range(plo..=phi);
    }
    Duration::from_secs(secs)
}

impl Pacing {
    pub fn new(store: Arc<Store>, config: Arc<PacelineConfig>) -> Self {
        Self { store, config }
    }

    fn bound(&self, key: &str, fallback: u64) -> Result<u64> {
        if let Some(v) = self.store.setting_i64(key)? {
            return Ok(v.max(0) as u64);
        }
        Ok(fallback)
    }

    /// Delay to wait after dispatching a `kind` action. Bounds are
    /// re-resolved from settings on every call.
    pub fn delay_for(&self, kind: ActionKind) -> Result<Duration> {
        let limits = self.config.limits.for_kind(kind);
        let min = self.bound(&format!("{kind}_min_delay_secs"), limits.min_delay_secs)?;
        let max = self.bound(&format!("{kind}_max_delay_secs"), limits.max_delay_secs)?;
        Ok(sample_delay(&mut rand::thread_rng(), min, max, &self.config.pacing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_delay_stays_in_bounds() {
        let pacing = PacingConfig {
            extra_pause_probability: 0.2,
            extra_pause_min_secs: 60,
            extra_pause_max_secs: 180,
        };
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let d = sample_delay(&mut rng, 240, 840, &pacing).as_secs();
            assert!((240..=840 + 180).contains(&d), "delay {d} out of range");
        }
    }

    #[test]
    fn test_zero_probability_never_extends() {
        let pacing = PacingConfig {
            extra_pause_probability: 0.0,
            extra_pause_min_secs: 60,
            extra_pause_max_secs: 180,
        };
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..200 {
            let d = sample_delay(&mut rng, 5, 10, &pacing).as_secs();
            assert!((5..=10).contains(&d));
        }
    }

    #[test]
    fn test_inverted_bounds_are_tolerated() {
        let pacing = PacingConfig {
            extra_pause_probability: 0.0,
            extra_pause_min_secs: 0,
            extra_pause_max_secs: 0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let d = sample_delay(&mut rng, 9, 3, &pacing).as_secs();
        assert!((3..=9).contains(&d));
    }

    #[test]
    fn test_settings_override_delay_bounds() {
        let store = Arc::new(Store::open_in_memory().unwrap());
        store.set_setting("like_min_delay_secs", "1").unwrap();
        store.set_setting("like_max_delay_secs", "2").unwrap();
        let config = Arc::new(PacelineConfig::default());
        let pacing = Pacing::new(store, config);
        for _ in 0..50 {
            let d = pacing.delay_for(ActionKind::Like).unwrap().as_secs();
            // Base 1..=2 plus an occasional 60..=180 pause.
            assert!(d <= 2 || (61..=182).contains(&d), "delay {d}");
        }
    }
}
