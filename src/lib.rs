pub mod api;
pub mod config;
pub mod errors;
pub mod forecast;
pub mod hubspot;
pub mod metrics;
pub mod models;
pub mod services;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::forecast::ForecastRunner;

#[derive(Clone)]
pub struct AppState {
    pub runner: Arc<ForecastRunner>,
    pub config: AppConfig,
    pub metrics_handle: metrics_exporter_prometheus::PrometheusHandle,
}
