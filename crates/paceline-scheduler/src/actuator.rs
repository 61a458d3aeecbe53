//! Actuator seam — the boundary between scheduling and side effects.
//!
//! The runtime never talks to the outside world itself. It hands an
//! [`ActionRequest`] to whatever [`Actuator`] is registered for the
//! item's kind and reacts to the returned [`ActionOutcome`]. Actuator
//! failures are recorded against the item, never raised.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use paceline_core::types::ActionKind;

/// Everything an actuator gets to see about one queued action.
#[derive(Debug, Clone)]
pub struct ActionRequest {
    pub item_id: i64,
    pub campaign_id: i64,
    pub sender_id: i64,
    pub kind: ActionKind,
    pub target_name: String,
    pub target_url: String,
    /// Kind-specific payload, e.g. comment text. Empty for likes.
    pub payload: String,
}

#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub success: bool,
    /// Failure detail, stored on the item verbatim.
    pub detail: Option<String>,
    /// Optional payload returned by the integration (e.g. an external
    /// id), surfaced in the activity feed.
    pub result_payload: Option<String>,
}

impl ActionOutcome {
    pub fn success() -> Self {
        Self { success: true, detail: None, result_payload: None }
    }

    pub fn success_with(result_payload: impl Into<String>) -> Self {
        Self { success: true, detail: None, result_payload: Some(result_payload.into()) }
    }

    pub fn failure(detail: impl Into<String>) -> Self {
        Self { success: false, detail: Some(detail.into()), result_payload: None }
    }
}

#[async_trait]
pub trait Actuator: Send + Sync {
    async fn perform(&self, request: &ActionRequest) -> ActionOutcome;
}

/// Registry of actuators by action kind.
#[derive(Default, Clone)]
pub struct ActuatorSet {
    actuators: HashMap<ActionKind, Arc<dyn Actuator>>,
}

impl ActuatorSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, kind: ActionKind, actuator: Arc<dyn Actuator>) -> Self {
        self.actuators.insert(kind, actuator);
        self
    }

    /// One actuator handling every kind.
    pub fn uniform(actuator: Arc<dyn Actuator>) -> Self {
        let mut set = Self::new();
        for kind in ActionKind::ALL {
            set.actuators.insert(kind, actuator.clone());
        }
        set
    }

    pub fn get(&self, kind: ActionKind) -> Option<Arc<dyn Actuator>> {
        self.actuators.get(&kind).cloned()
    }
}

/// Logs what it would do and reports success. The `run` daemon uses
/// this until a real integration is wired in.
pub struct DryRunActuator;

#[async_trait]
impl Actuator for DryRunActuator {
    async fn perform(&self, request: &ActionRequest) -> ActionOutcome {
        tracing::info!(
            item = request.item_id,
            kind = %request.kind,
            target = %request.target_url,
            "dry-run dispatch"
        );
        ActionOutcome::success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_uniform_set_covers_all_kinds() {
        let set = ActuatorSet::uniform(Arc::new(DryRunActuator));
        for kind in ActionKind::ALL {
            let actuator = set.get(kind).unwrap();
            let request = ActionRequest {
                item_id: 1,
                campaign_id: 1,
                sender_id: 1,
                kind,
                target_name: "T".into(),
                target_url: "https://example.com/t".into(),
                payload: String::new(),
            };
            assert!(actuator.perform(&request).await.success);
        }
    }

    #[test]
    fn test_outcome_constructors() {
        assert!(ActionOutcome::success().detail.is_none());
        let fail = ActionOutcome::failure("timed out");
        assert!(!fail.success);
        assert_eq!(fail.detail.as_deref(), Some("timed out"));
    }
}
