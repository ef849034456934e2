//! REST API endpoints.
//!
//! Handlers are thin: extract, call a service, map the result.
//! - Users: account administration
//! - Events: CRUD, lifecycle transitions and statistics
//! - Registrations: signing up, cancelling and organizer review

pub mod events;
pub mod registrations;
pub mod users;

use eventhub_core::{DEFAULT_PAGE_SIZE, PageRequest};
use serde::Deserialize;

/// `page` / `page_size` query parameters.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    /// Page number (0-indexed)
    #[serde(default)]
    pub page: u32,
    /// Page size (default: 20, max: 100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

const fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

impl From<PageParams> for PageRequest {
    fn from(params: PageParams) -> Self {
        Self::new(params.page, params.page_size)
    }
}
