//! Repository layer.
//!
//! Unlike a table-per-repo layout, the progression engine persists a single
//! aggregate per user, so one repository owns every operation on it.

pub mod progress_repo;

pub use progress_repo::{CourseGraph, ProgressRepo};
