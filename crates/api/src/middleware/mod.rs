//! Request extractors shared by handlers.
//!
//! - [`auth::AuthUser`] -- the user resolved from a JWT Bearer token.
//! - [`validated::ValidatedJson`] -- a JSON body checked with `validator`.

pub mod auth;
pub mod validated;
