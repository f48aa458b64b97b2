//! HOS Trip Planner - FMCSA Part 395 hours-of-service trip planning core.

mod cli;
mod planner;
mod services;
mod types;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use planner::PlannerOrchestrator;
use services::{geocoding::create_geocoder, routing::create_routing_provider_with_fallback, GeoProvider};
use types::rules::RuleConstants;
use types::trip::TripRequest;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    init_logging();

    let rules = RuleConstants::from_env()?;
    info!("rule constants loaded");

    match cli.command {
        Some(cli::Command::Plan {
            driver_id,
            current_cycle_used_hours,
            current_location,
            pickup_location,
            dropoff_location,
            total_miles,
            average_speed_mph,
            planned_start_time,
        }) => {
            let planned_start_time = planned_start_time
                .map(|raw| {
                    chrono::DateTime::parse_from_rfc3339(&raw).context("planned_start_time must be RFC 3339")
                })
                .transpose()?;

            let request = TripRequest::new(
                driver_id,
                current_cycle_used_hours,
                current_location,
                pickup_location,
                dropoff_location,
                total_miles,
                average_speed_mph,
                planned_start_time,
            )?;

            let geocoder = create_geocoder();
            let router = create_routing_provider_with_fallback(std::env::var("OSRM_URL").ok()).await;
            let geo = GeoProvider::new(geocoder, router);

            let orchestrator = PlannerOrchestrator::new(&geo, &rules);
            let plan = orchestrator.plan(&request).await?;

            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(())
        }
        None => {
            info!("no subcommand given; run with `plan --help` for usage");
            Ok(())
        }
    }
}

fn init_logging() {
    let logs_dir = std::env::var("LOGS_DIR").unwrap_or_else(|_| "../logs".to_string());
    std::fs::create_dir_all(&logs_dir).ok();

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &logs_dir, "hos-trip-planner.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    // Leak the guard: the writer must outlive the subscriber for the
    // lifetime of the process.
    Box::leak(Box::new(guard));

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,hos_trip_planner=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();
}
