use async_trait::async_trait;
use thiserror::Error;

use super::types::{CrmObject, Page, PropertyMap, SearchRequest, SearchResponse};

/// Association kind used when the link carries no label.
pub const DEFAULT_ASSOCIATION: &str = "default";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("CRM returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// The CRM operations the forecast job needs. Every call is a single
/// request/response exchange; implementations do not retry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch one page of `object_type` records, starting after `after`.
    async fn list_page(
        &self,
        object_type: &str,
        limit: u32,
        after: Option<&str>,
        properties: &[&str],
    ) -> Result<Page, StoreError>;

    async fn search(
        &self,
        object_type: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, StoreError>;

    async fn create(
        &self,
        object_type: &str,
        properties: &PropertyMap,
    ) -> Result<CrmObject, StoreError>;

    async fn update(
        &self,
        object_type: &str,
        id: &str,
        properties: &PropertyMap,
    ) -> Result<CrmObject, StoreError>;

    /// Link `from_type/from_id` to `to_type/to_id`.
    async fn associate(
        &self,
        from_type: &str,
        from_id: &str,
        kind: &str,
        to_type: &str,
        to_id: &str,
    ) -> Result<(), StoreError>;
}
