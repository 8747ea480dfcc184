use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus exporter and register all forecast metrics.
/// Returns a `PrometheusHandle` whose `render()` method produces the
/// text/plain Prometheus scrape payload.
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    // Pre-register counters so they appear even before the first run.
    counter!("forecast_runs_total").absolute(0);
    counter!("forecast_runs_failed").absolute(0);
    counter!("forecast_records_created").absolute(0);
    counter!("forecast_records_updated").absolute(0);
    counter!("forecast_deals_scanned_total").absolute(0);
    counter!("forecast_associations_total").absolute(0);

    gauge!("forecast_deals_next_7_days").set(0.0);
    gauge!("forecast_revenue_next_7_days").set(0.0);

    histogram!("forecast_run_duration_seconds").record(0.0);

    Ok(handle)
}
