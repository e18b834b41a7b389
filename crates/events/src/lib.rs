//! Progression events.
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`ProgressEvent`]: the event envelope published after a successful
//!   enrollment or lesson completion.
//! - [`EventLogger`]: background subscriber that writes every event to the
//!   trace log.

pub mod bus;
pub mod logger;

pub use bus::{EventBus, EventKind, ProgressEvent};
pub use logger::EventLogger;
