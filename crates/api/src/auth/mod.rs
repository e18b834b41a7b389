//! Bearer-token verification.
//!
//! Tokens are issued by the platform's session service; this crate only
//! verifies them and reads the user id. [`jwt::generate_access_token`] exists
//! for tests and local tooling.

pub mod jwt;
