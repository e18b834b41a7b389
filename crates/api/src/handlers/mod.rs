pub mod courses;
pub mod profile;
pub mod progress;
