use std::env;
use std::time::Duration;

use crate::forecast::ForecastConfig;
use crate::hubspot::client::HUBSPOT_API_BASE;

#[derive(Debug, Clone)]
pub struct AppConfig {
    // HubSpot private app
    pub hubspot_access_token: String,
    pub hubspot_api_base: String,
    pub hubspot_timeout_secs: u64,

    // Forecast target
    pub forecast_object_type_id: String,
    pub forecast_pipeline_id: String,

    // Scheduler
    pub forecast_interval_secs: u64,
    pub forecast_run_on_start: bool,

    // HTTP trigger
    pub host: String,
    pub port: u16,
    pub api_token: Option<String>,
    pub log_json: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            hubspot_access_token: required("HUBSPOT_ACCESS_TOKEN")?,
            hubspot_api_base: env::var("HUBSPOT_API_BASE")
                .unwrap_or_else(|_| HUBSPOT_API_BASE.into()),
            hubspot_timeout_secs: env::var("HUBSPOT_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .unwrap_or(30),

            forecast_object_type_id: required("FORECAST_OBJECT_TYPE_ID")?,
            forecast_pipeline_id: required("FORECAST_PIPELINE_ID")?,

            forecast_interval_secs: env::var("FORECAST_INTERVAL_SECS")
                .unwrap_or_else(|_| "86400".into())
                .parse()
                .unwrap_or(86_400),
            forecast_run_on_start: match env::var("FORECAST_RUN_ON_START") {
                Ok(raw) => parse_flag("FORECAST_RUN_ON_START", &raw)?,
                Err(_) => true,
            },

            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,
            api_token: env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),
            log_json: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    pub fn forecast(&self) -> ForecastConfig {
        ForecastConfig {
            object_type_id: self.forecast_object_type_id.clone(),
            pipeline_id: self.forecast_pipeline_id.clone(),
        }
    }

    /// Request timeout for CRM calls, never below one second.
    pub fn hubspot_timeout(&self) -> Duration {
        Duration::from_secs(self.hubspot_timeout_secs.max(1))
    }
}

/// Presence check only; the CRM is the one that rejects bad values.
fn required(key: &str) -> anyhow::Result<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("{key} must be set"))
}

fn parse_flag(key: &str, raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{key} must be a boolean (true/false/1/0/yes/no), got {other:?}"),
    }
}
