use std::sync::Arc;

use clap::{Parser, Subcommand};

use deal_forecast::api::router::create_router;
use deal_forecast::config::AppConfig;
use deal_forecast::forecast::ForecastRunner;
use deal_forecast::hubspot::HubSpotClient;
use deal_forecast::services::scheduler::run_forecast_scheduler;
use deal_forecast::AppState;

#[derive(Parser)]
#[command(name = "deal-forecast", version, about = "7-day deal revenue forecast for a HubSpot pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the forecast once for today and exit
    Run,
    /// Run the forecast on a fixed interval
    Schedule,
    /// Serve the HTTP trigger and metrics, with the scheduler in the background
    Serve {
        /// Do not start the background scheduler
        #[arg(long)]
        no_schedule: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    init_tracing(config.log_json);

    let client = HubSpotClient::from_parts(
        &config.hubspot_api_base,
        config.hubspot_access_token.clone(),
        config.hubspot_timeout(),
    )?;
    let runner = Arc::new(ForecastRunner::new(Arc::new(client), config.forecast()));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            let outcome = runner.run_now().await?;
            tracing::info!(
                date = %outcome.date,
                record_id = %outcome.record_id,
                action = %outcome.action,
                deals = outcome.aggregate.deal_count,
                revenue = %outcome.aggregate.total_value,
                associations = outcome.associations,
                "Forecast run complete"
            );
            println!("{}", outcome.message());
        }
        Command::Schedule => {
            run_forecast_scheduler(
                runner,
                config.forecast_interval_secs,
                config.forecast_run_on_start,
            )
            .await;
        }
        Command::Serve { no_schedule } => {
            let metrics_handle = deal_forecast::metrics::init_metrics()?;
            let addr = format!("{}:{}", config.host, config.port);

            if no_schedule {
                tracing::info!("Scheduler disabled, runs only via POST /api/run");
            } else {
                let sched_runner = runner.clone();
                let interval_secs = config.forecast_interval_secs;
                let run_on_start = config.forecast_run_on_start;
                tokio::spawn(async move {
                    run_forecast_scheduler(sched_runner, interval_secs, run_on_start).await;
                });
            }

            if config.api_token.is_none() {
                tracing::warn!("API_TOKEN is not set, POST /api/run is unauthenticated");
            }

            let state = AppState {
                runner,
                config,
                metrics_handle,
            };
            let router = create_router(state);

            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Server listening on {addr}");
            axum::serve(listener, router).await?;
        }
    }

    Ok(())
}

fn init_tracing(json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
