//! HTTP handlers shared by every EventHub deployment.

pub mod health;

// Re-export common handler utilities
pub use health::{health_check, readiness};
