pub mod client;
pub mod store;
pub mod types;

pub use client::HubSpotClient;
pub use store::{RecordStore, StoreError, DEFAULT_ASSOCIATION};
pub use types::{CrmObject, Page, PropertyMap, SearchRequest, SearchResponse};
