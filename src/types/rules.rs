//! FMCSA Part 395 rule constants (C1).
//!
//! Every numeric limit the planner enforces lives here, loaded once at
//! process start and passed by reference to every consumer. Nothing below
//! mutates after `RuleConstants::from_env()` returns.

use anyhow::{Context, Result};

/// Named numeric limits and duty-status codes enforced by the planner.
///
/// All fields are overridable via `HOS_`-prefixed environment variables
/// (e.g. `HOS_MAX_DRIVING_HOURS`); missing variables take the FMCSA
/// Part 395 defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleConstants {
    pub max_driving_hours: f64,
    pub max_on_duty_window: f64,
    pub max_cycle_hours: f64,
    pub cycle_days: u32,
    pub minimum_rest_hours: f64,
    pub break_required_after_hours: f64,
    pub break_duration_minutes: f64,
    pub fuel_interval_miles: f64,
    pub fuel_stop_duration_minutes: f64,
    pub pickup_duration_hours: f64,
    pub dropoff_duration_hours: f64,
    pub max_continuous_driving_hours: f64,
    pub default_average_speed_mph: f64,
}

impl Default for RuleConstants {
    fn default() -> Self {
        Self {
            max_driving_hours: 11.0,
            max_on_duty_window: 14.0,
            max_cycle_hours: 70.0,
            cycle_days: 8,
            minimum_rest_hours: 10.0,
            break_required_after_hours: 8.0,
            break_duration_minutes: 30.0,
            fuel_interval_miles: 1000.0,
            fuel_stop_duration_minutes: 30.0,
            pickup_duration_hours: 1.0,
            dropoff_duration_hours: 1.0,
            max_continuous_driving_hours: 2.0,
            default_average_speed_mph: 55.0,
        }
    }
}

impl RuleConstants {
    /// Load rule constants from `HOS_`-prefixed environment variables,
    /// falling back to the FMCSA defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        let defaults = Self::default();

        Ok(Self {
            max_driving_hours: env_f64("HOS_MAX_DRIVING_HOURS", defaults.max_driving_hours)?,
            max_on_duty_window: env_f64("HOS_MAX_ON_DUTY_WINDOW", defaults.max_on_duty_window)?,
            max_cycle_hours: env_f64("HOS_MAX_CYCLE_HOURS", defaults.max_cycle_hours)?,
            cycle_days: env_u32("HOS_CYCLE_DAYS", defaults.cycle_days)?,
            minimum_rest_hours: env_f64("HOS_MINIMUM_REST_HOURS", defaults.minimum_rest_hours)?,
            break_required_after_hours: env_f64(
                "HOS_BREAK_REQUIRED_AFTER_HOURS",
                defaults.break_required_after_hours,
            )?,
            break_duration_minutes: env_f64(
                "HOS_BREAK_DURATION_MINUTES",
                defaults.break_duration_minutes,
            )?,
            fuel_interval_miles: env_f64("HOS_FUEL_INTERVAL_MILES", defaults.fuel_interval_miles)?,
            fuel_stop_duration_minutes: env_f64(
                "HOS_FUEL_STOP_DURATION_MINUTES",
                defaults.fuel_stop_duration_minutes,
            )?,
            pickup_duration_hours: env_f64(
                "HOS_PICKUP_DURATION_HOURS",
                defaults.pickup_duration_hours,
            )?,
            dropoff_duration_hours: env_f64(
                "HOS_DROPOFF_DURATION_HOURS",
                defaults.dropoff_duration_hours,
            )?,
            max_continuous_driving_hours: env_f64(
                "HOS_MAX_CONTINUOUS_DRIVING_HOURS",
                defaults.max_continuous_driving_hours,
            )?,
            default_average_speed_mph: env_f64(
                "HOS_DEFAULT_AVERAGE_SPEED_MPH",
                defaults.default_average_speed_mph,
            )?,
        })
    }

    pub fn break_duration_hours(&self) -> f64 {
        self.break_duration_minutes / 60.0
    }

    pub fn fuel_stop_duration_hours(&self) -> f64 {
        self.fuel_stop_duration_minutes / 60.0
    }
}

fn env_f64(key: &str, default: f64) -> Result<f64> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{key} must be a number")),
        Err(_) => Ok(default),
    }
}

fn env_u32(key: &str, default: u32) -> Result<u32> {
    match std::env::var(key) {
        Ok(raw) => raw.parse().with_context(|| format!("{key} must be an integer")),
        Err(_) => Ok(default),
    }
}

/// Duty status, the closed variant every `DutyEvent` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DutyStatus {
    OffDuty,
    Sleeper,
    Driving,
    OnDuty,
}

/// Stop type, the closed variant the Stop Planner (C4) inserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StopType {
    Pickup,
    Dropoff,
    Break,
    Rest,
    Fuel,
}

impl StopType {
    /// Fixed mapping from stop type to the duty status it produces.
    pub fn duty_status(self) -> DutyStatus {
        match self {
            StopType::Pickup => DutyStatus::OnDuty,
            StopType::Dropoff => DutyStatus::OnDuty,
            StopType::Break => DutyStatus::OffDuty,
            StopType::Rest => DutyStatus::Sleeper,
            StopType::Fuel => DutyStatus::OnDuty,
        }
    }
}
