//! Subscription tier gate.
//!
//! Evaluated before any graph is shown and before any enroll or completion
//! call, independently of node-level locking.

use async_trait::async_trait;
use serde::Serialize;

use crate::catalog::{CourseDefinition, Tier};
use crate::error::CoreError;
use crate::types::DbId;

/// Supplies a user's current subscription tier.
#[async_trait]
pub trait SubscriptionProvider: Send + Sync {
    async fn current_tier(&self, user_id: DbId) -> Result<Tier, CoreError>;
}

/// Outcome of comparing a course's required tier with the user's tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TierDecision {
    pub allowed: bool,
    pub required: Tier,
    pub current: Tier,
    /// Present only when access is refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgrade_prompt: Option<String>,
}

/// Compare ordinal ranks; a lower user rank is refused with an upgrade prompt.
pub fn evaluate(required: Tier, current: Tier) -> TierDecision {
    let allowed = current.rank() >= required.rank();
    TierDecision {
        allowed,
        required,
        current,
        upgrade_prompt: (!allowed).then(|| upgrade_prompt(required)),
    }
}

/// Fail with `TierRequired` when the user's tier is below the course's.
pub fn check_access(course: &CourseDefinition, current: Tier) -> Result<(), CoreError> {
    let decision = evaluate(course.required_tier, current);
    if decision.allowed {
        Ok(())
    } else {
        Err(CoreError::TierRequired {
            required: decision.required,
            current: decision.current,
        })
    }
}

/// Text shown in place of the graph when access is refused.
pub fn upgrade_prompt(required: Tier) -> String {
    format!("Upgrade to the {required} plan to unlock this course.")
}
