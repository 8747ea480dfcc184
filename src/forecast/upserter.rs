use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::hubspot::{RecordStore, DEFAULT_ASSOCIATION};
use crate::models::deal::DEAL_ASSOCIATION_TYPE;
use crate::models::{ForecastAggregate, ForecastRecord};

use super::ForecastError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpsertAction {
    Created,
    Updated,
}

impl fmt::Display for UpsertAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertAction::Created => write!(f, "created"),
            UpsertAction::Updated => write!(f, "updated"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpsertOutcome {
    pub record_id: String,
    pub action: UpsertAction,
    pub record: ForecastRecord,
    pub associations: usize,
}

/// Write today's forecast and link every matched deal to it.
///
/// With `existing_id` the record is overwritten in place, otherwise a new one
/// is created. Associations are then created one at a time in matched order.
/// A failure part-way leaves the links made so far in place.
pub async fn upsert_forecast<S>(
    store: &S,
    object_type_id: &str,
    aggregate: &ForecastAggregate,
    now: DateTime<Utc>,
    existing_id: Option<&str>,
) -> Result<UpsertOutcome, ForecastError>
where
    S: RecordStore + ?Sized,
{
    let record = ForecastRecord::for_day(aggregate, now);
    let properties = record.to_properties();

    let (record_id, action) = match existing_id {
        Some(id) => {
            let updated = store
                .update(object_type_id, id, &properties)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, record_id = id, "Error updating forecast record");
                    ForecastError::Upsert(e)
                })?;
            tracing::info!(record_id = %updated.id, date = %record.date, "Updated forecast record");
            (id.to_string(), UpsertAction::Updated)
        }
        None => {
            let created = store
                .create(object_type_id, &properties)
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Error creating forecast record");
                    ForecastError::Upsert(e)
                })?;
            tracing::info!(record_id = %created.id, date = %record.date, "Created forecast record");
            (created.id, UpsertAction::Created)
        }
    };

    let mut associations = 0usize;
    for deal_id in &aggregate.matched_deal_ids {
        store
            .associate(
                object_type_id,
                &record_id,
                DEFAULT_ASSOCIATION,
                DEAL_ASSOCIATION_TYPE,
                deal_id,
            )
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    record_id = %record_id,
                    deal_id = %deal_id,
                    linked = associations,
                    "Error associating deal with forecast record"
                );
                ForecastError::Upsert(e)
            })?;
        associations += 1;
    }

    metrics::counter!("forecast_associations_total").increment(associations as u64);
    tracing::debug!(record_id = %record_id, associations, "Associated deals with forecast record");

    Ok(UpsertOutcome {
        record_id,
        action,
        record,
        associations,
    })
}
