pub mod calculator;
pub mod fetcher;
pub mod runner;
pub mod upserter;

use thiserror::Error;

use crate::hubspot::StoreError;

pub use calculator::{compute_forecast, FORECAST_WINDOW_DAYS};
pub use fetcher::{fetch_pipeline_deals, DEAL_PAGE_SIZE};
pub use runner::{ForecastRunner, RunOutcome};
pub use upserter::{upsert_forecast, UpsertAction, UpsertOutcome};

/// Which custom object holds the forecasts and which pipeline feeds them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForecastConfig {
    pub object_type_id: String,
    pub pipeline_id: String,
}

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("failed to fetch pipeline deals")]
    Fetch(#[source] StoreError),

    #[error("failed to search for today's forecast")]
    Search(#[source] StoreError),

    #[error("failed to write forecast")]
    Upsert(#[source] StoreError),
}
