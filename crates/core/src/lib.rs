//! Course progression domain logic.
//!
//! No I/O lives here: the graph builder, status resolver, tier gate and xp
//! accounting are pure functions, and the enroll/complete mutations operate on
//! an in-memory [`profile::UserProfile`] that the persistence layer loads and
//! writes back.

pub mod aliases;
pub mod catalog;
pub mod curriculum;
pub mod error;
pub mod profile;
pub mod progress;
pub mod status;
pub mod tier;
pub mod types;
pub mod xp;
