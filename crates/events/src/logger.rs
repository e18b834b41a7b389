//! Trace-log sink for progression events.
//!
//! Runs as a background task and exits when the [`EventBus`](crate::EventBus)
//! is dropped.

use tokio::sync::broadcast;

use crate::bus::ProgressEvent;

pub struct EventLogger;

impl EventLogger {
    /// Log every event received on `receiver` until the channel closes.
    /// Returns the number of events logged.
    pub async fn run(mut receiver: broadcast::Receiver<ProgressEvent>) -> u64 {
        let mut logged = 0;
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    tracing::info!(
                        kind = %event.kind,
                        user_id = event.user_id,
                        course_id = %event.course_id,
                        lesson_id = event.lesson_id.as_deref(),
                        xp = event.xp_gained,
                        "Progress event"
                    );
                    logged += 1;
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Event logger lagged, some events were not logged");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, event logger shutting down");
                    break;
                }
            }
        }
        logged
    }
}
