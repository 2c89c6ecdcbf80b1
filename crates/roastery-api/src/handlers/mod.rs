//! API handlers

pub mod auth;
pub mod beans;
pub mod health;
pub mod lists;
pub mod origins;
pub mod reviews;
pub mod tags;

use roastery_core::Page;
use serde::Deserialize;

/// Query parameters shared by every listing endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Page number (1-indexed)
    pub page: Option<u32>,

    /// Items per page
    pub page_size: Option<u32>,
}

impl From<Pagination> for Page {
    fn from(params: Pagination) -> Self {
        Page::new(params.page, params.page_size)
    }
}
