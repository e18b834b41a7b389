//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! Shared as `Arc<EventBus>`. Publishing never blocks and never fails; an
//! event with no subscribers is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use coursepath_core::types::DbId;

// ---------------------------------------------------------------------------
// ProgressEvent
// ---------------------------------------------------------------------------

pub const COURSE_ENROLLED: &str = "course.enrolled";
pub const LESSON_COMPLETED: &str = "lesson.completed";
pub const COURSE_COMPLETED: &str = "course.completed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "course.enrolled")]
    CourseEnrolled,
    #[serde(rename = "lesson.completed")]
    LessonCompleted,
    #[serde(rename = "course.completed")]
    CourseCompleted,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CourseEnrolled => COURSE_ENROLLED,
            Self::LessonCompleted => LESSON_COMPLETED,
            Self::CourseCompleted => COURSE_COMPLETED,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Something that happened to one user's progress in one course.
///
/// Built with [`ProgressEvent::new`] and the `with_*` methods.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub kind: EventKind,
    pub user_id: DbId,
    pub course_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<String>,
    /// XP granted by the operation that produced the event.
    pub xp_gained: i64,
    /// Event-specific extras.
    pub payload: serde_json::Value,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn new(kind: EventKind, user_id: DbId, course_id: impl Into<String>) -> Self {
        Self {
            kind,
            user_id,
            course_id: course_id.into(),
            lesson_id: None,
            xp_gained: 0,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: Utc::now(),
        }
    }

    pub fn with_lesson(mut self, lesson_id: impl Into<String>) -> Self {
        self.lesson_id = Some(lesson_id.into());
        self
    }

    pub fn with_xp(mut self, xp_gained: i64) -> Self {
        self.xp_gained = xp_gained;
        self
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// ```rust
/// use coursepath_events::bus::{EventBus, EventKind, ProgressEvent};
///
/// let bus = EventBus::default();
/// let mut rx = bus.subscribe();
///
/// bus.publish(ProgressEvent::new(EventKind::CourseEnrolled, 1, "python-basics"));
/// ```
pub struct EventBus {
    sender: broadcast::Sender<ProgressEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity. Receivers that fall
    /// more than `capacity` events behind observe `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: ProgressEvent) {
        // A send error only means there are no receivers.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
