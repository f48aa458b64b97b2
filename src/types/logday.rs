//! Per-calendar-day log sheets produced by the Logbook Transformer (C5).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::duty::DutyEvent;

/// One calendar date's worth of duty segments plus the four daily totals.
/// That the totals sum to 24h, the first segment starts at local
/// midnight, and no segment crosses midnight are enforced by the
/// Compliance Validator (C6), not by this type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogDay {
    pub date: NaiveDate,
    pub segments: Vec<DutyEvent>,
    pub total_driving_hours: f64,
    pub total_on_duty_hours: f64,
    pub total_off_duty_hours: f64,
    pub total_sleeper_hours: f64,
}

impl LogDay {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            segments: Vec::new(),
            total_driving_hours: 0.0,
            total_on_duty_hours: 0.0,
            total_off_duty_hours: 0.0,
            total_sleeper_hours: 0.0,
        }
    }

    pub fn total_hours(&self) -> f64 {
        self.total_driving_hours
            + self.total_on_duty_hours
            + self.total_off_duty_hours
            + self.total_sleeper_hours
    }
}
