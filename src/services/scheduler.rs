use std::sync::Arc;

use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::forecast::ForecastRunner;

/// Run the forecast every `interval_secs`.
///
/// A failed run is logged and the loop waits for the next tick; nothing is
/// retried in between. With `run_on_start` the first run happens
/// immediately, otherwise one full interval after start.
pub async fn run_forecast_scheduler(
    runner: Arc<ForecastRunner>,
    interval_secs: u64,
    run_on_start: bool,
) {
    let period = Duration::from_secs(interval_secs.max(1));
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    // The first tick of a tokio interval completes immediately.
    if !run_on_start {
        ticker.tick().await;
    }

    tracing::info!(
        interval_secs,
        run_on_start,
        object_type_id = %runner.config().object_type_id,
        pipeline_id = %runner.config().pipeline_id,
        "Forecast scheduler started"
    );

    loop {
        ticker.tick().await;

        match runner.run_now().await {
            Ok(outcome) => {
                tracing::info!(
                    date = %outcome.date,
                    record_id = %outcome.record_id,
                    action = %outcome.action,
                    deals = outcome.aggregate.deal_count,
                    revenue = %outcome.aggregate.total_value,
                    "{}",
                    outcome.message()
                );
            }
            Err(e) => {
                tracing::error!(error = ?e, "Scheduled forecast run failed, waiting for next tick");
            }
        }
    }
}
