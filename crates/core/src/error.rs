use crate::catalog::Tier;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Already enrolled in course {course_id}")]
    AlreadyEnrolled { course_id: String },

    #[error("Lesson {lesson_id} of course {course_id} is already completed")]
    AlreadyCompleted { course_id: String, lesson_id: String },

    #[error("Not enrolled in course {course_id}")]
    NotEnrolled { course_id: String },

    #[error("Record {key} was modified concurrently")]
    StaleRecord { key: String },

    #[error("Node {node_id} is locked")]
    NodeLocked { node_id: String },

    #[error("Course requires the {required} tier (current tier: {current})")]
    TierRequired { required: Tier, current: Tier },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Conflicts are idempotent "already done" signals rather than failures.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            CoreError::AlreadyEnrolled { .. } | CoreError::AlreadyCompleted { .. }
        )
    }
}
