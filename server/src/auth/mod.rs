//! Authentication for the EventHub HTTP API.
//!
//! - [`middleware`]: extractors that turn a bearer token into an [`Actor`](crate::app::Actor)
//! - [`handlers`]: register, login and "who am I" endpoints

pub mod handlers;
pub mod middleware;

pub use middleware::{AuthUser, MaybeAuthUser, RequireAdmin, RequireOrganizer};
