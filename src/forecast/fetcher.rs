use crate::hubspot::RecordStore;
use crate::models::deal::{DEAL_OBJECT_TYPE, DEAL_PROPERTIES};
use crate::models::Deal;

use super::ForecastError;

/// Largest page the deals list endpoint accepts.
pub const DEAL_PAGE_SIZE: u32 = 100;

/// Fetch every deal in `pipeline_id`.
///
/// The list endpoint cannot filter by pipeline, so every page of deals is
/// read and filtered here. Pages without a single match do not end the scan;
/// only a missing next-page cursor does. Cost therefore grows with the
/// portal's total deal count, not the pipeline's.
pub async fn fetch_pipeline_deals<S>(store: &S, pipeline_id: &str) -> Result<Vec<Deal>, ForecastError>
where
    S: RecordStore + ?Sized,
{
    let mut deals: Vec<Deal> = Vec::new();
    let mut after: Option<String> = None;
    let mut pages: u32 = 0;
    let mut scanned: usize = 0;

    loop {
        let page = store
            .list_page(DEAL_OBJECT_TYPE, DEAL_PAGE_SIZE, after.as_deref(), &DEAL_PROPERTIES)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, page = pages, "Error fetching deals");
                ForecastError::Fetch(e)
            })?;

        pages += 1;
        scanned += page.results.len();
        let next = page.next_cursor().map(str::to_string);

        deals.extend(
            page.results
                .into_iter()
                .map(Deal::from)
                .filter(|d| d.in_pipeline(pipeline_id)),
        );

        match next {
            Some(cursor) => after = Some(cursor),
            None => break,
        }
    }

    metrics::counter!("forecast_deals_scanned_total").increment(scanned as u64);
    tracing::info!(
        pipeline_id,
        pages,
        scanned,
        matched = deals.len(),
        "Fetched pipeline deals"
    );

    Ok(deals)
}
