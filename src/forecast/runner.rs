use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::Instrument;
use uuid::Uuid;

use crate::hubspot::{RecordStore, SearchRequest};
use crate::models::forecast::{date_key, PROP_DATE};
use crate::models::ForecastAggregate;

use super::calculator::compute_forecast;
use super::fetcher::fetch_pipeline_deals;
use super::upserter::{upsert_forecast, UpsertAction};
use super::{ForecastConfig, ForecastError};

pub const SUCCESS_MESSAGE: &str = "Forecast updated successfully";

/// Result of a successful daily run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunOutcome {
    pub run_id: Uuid,
    pub ran_at: DateTime<Utc>,
    pub date: String,
    pub record_id: String,
    pub action: UpsertAction,
    pub associations: usize,
    pub aggregate: ForecastAggregate,
}

impl RunOutcome {
    pub fn message(&self) -> &'static str {
        SUCCESS_MESSAGE
    }
}

/// Runs the daily forecast: look up today's record, recompute, upsert.
///
/// The lookup and the write are not atomic. Two processes running on the
/// same UTC day can both miss the lookup and create two records, so only one
/// scheduler may drive a given portal. Runs inside one process are
/// serialised.
pub struct ForecastRunner {
    store: Arc<dyn RecordStore>,
    config: ForecastConfig,
    run_lock: Mutex<()>,
    last_outcome: RwLock<Option<RunOutcome>>,
}

impl ForecastRunner {
    pub fn new(store: Arc<dyn RecordStore>, config: ForecastConfig) -> Self {
        Self {
            store,
            config,
            run_lock: Mutex::new(()),
            last_outcome: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Most recent successful run of this process, if any.
    pub async fn last_outcome(&self) -> Option<RunOutcome> {
        self.last_outcome.read().await.clone()
    }

    pub async fn run_now(&self) -> Result<RunOutcome, ForecastError> {
        self.run_once(Utc::now()).await
    }

    /// Run the forecast for the UTC day containing `now`.
    pub async fn run_once(&self, now: DateTime<Utc>) -> Result<RunOutcome, ForecastError> {
        let _guard = self.run_lock.lock().await;

        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("forecast_run", run_id = %run_id);
        let started = Instant::now();

        metrics::counter!("forecast_runs_total").increment(1);
        let result = self.execute(run_id, now).instrument(span).await;
        metrics::histogram!("forecast_run_duration_seconds")
            .record(started.elapsed().as_secs_f64());

        match result {
            Ok(outcome) => {
                record_outcome_metrics(&outcome);
                *self.last_outcome.write().await = Some(outcome.clone());
                Ok(outcome)
            }
            Err(e) => {
                metrics::counter!("forecast_runs_failed").increment(1);
                tracing::error!(run_id = %run_id, error = ?e, "Forecast run failed");
                Err(e)
            }
        }
    }

    async fn execute(&self, run_id: Uuid, now: DateTime<Utc>) -> Result<RunOutcome, ForecastError> {
        let today = date_key(now.date_naive());
        let store = self.store.as_ref();

        let search = SearchRequest::exact_match(PROP_DATE, &today, 1);
        let existing = store
            .search(&self.config.object_type_id, &search)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, date = %today, "Error searching forecast records");
                ForecastError::Search(e)
            })?;
        let existing_id = existing.results.first().map(|r| r.id.clone());

        let deals = fetch_pipeline_deals(store, &self.config.pipeline_id).await?;
        let aggregate = compute_forecast(&deals, now);

        tracing::info!(
            date = %today,
            existing = ?existing_id,
            deals = aggregate.deal_count,
            revenue = %aggregate.total_value,
            skipped = aggregate.skipped_deal_ids.len(),
            "Computed 7-day forecast"
        );

        let upserted = upsert_forecast(
            store,
            &self.config.object_type_id,
            &aggregate,
            now,
            existing_id.as_deref(),
        )
        .await?;

        Ok(RunOutcome {
            run_id,
            ran_at: now,
            date: today,
            record_id: upserted.record_id,
            action: upserted.action,
            associations: upserted.associations,
            aggregate,
        })
    }
}

fn record_outcome_metrics(outcome: &RunOutcome) {
    match outcome.action {
        UpsertAction::Created => metrics::counter!("forecast_records_created").increment(1),
        UpsertAction::Updated => metrics::counter!("forecast_records_updated").increment(1),
    }
    metrics::gauge!("forecast_deals_next_7_days").set(outcome.aggregate.deal_count as f64);
    metrics::gauge!("forecast_revenue_next_7_days")
        .set(outcome.aggregate.total_value.to_f64().unwrap_or(0.0));
}
