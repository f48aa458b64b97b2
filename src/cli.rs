//! CLI argument parsing for the hos-trip-planner binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "hos-trip-planner", about = "FMCSA hours-of-service trip planner")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Plan a trip and print the resulting log days and stops as JSON.
    Plan {
        #[arg(long)]
        driver_id: String,
        #[arg(long)]
        current_cycle_used_hours: f64,
        #[arg(long)]
        current_location: String,
        #[arg(long)]
        pickup_location: String,
        #[arg(long)]
        dropoff_location: String,
        #[arg(long)]
        total_miles: Option<u32>,
        #[arg(long, default_value_t = 55.0)]
        average_speed_mph: f64,
        /// RFC 3339 timestamp; defaults to now (UTC) if omitted.
        #[arg(long)]
        planned_start_time: Option<String>,
    },
}
