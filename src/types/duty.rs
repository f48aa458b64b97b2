//! Duty events, stops, and the event timeline C4 produces.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::rules::{DutyStatus, StopType};

/// One horizontal segment on the FMCSA log graph. `start < end` strictly,
/// both carrying the same offset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DutyEvent {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub status: DutyStatus,
    pub city: String,
    pub state: String,
    /// Free text, truncated to 255 chars by `DutyEvent::new`.
    pub remark: String,
}

impl DutyEvent {
    pub fn new(
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
        status: DutyStatus,
        city: impl Into<String>,
        state: impl Into<String>,
        remark: impl Into<String>,
    ) -> Self {
        let mut remark = remark.into();
        remark.truncate(255);
        Self {
            start,
            end,
            status,
            city: city.into(),
            state: state.into(),
            remark,
        }
    }

    pub fn duration_hours(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 3_600_000.0
    }
}

/// A non-driving stop the planner inserted. Carries the same interval a
/// `DutyEvent` would, plus its `StopType` and position on the route.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stop {
    pub stop_type: StopType,
    pub scheduled_arrival: DateTime<FixedOffset>,
    pub scheduled_departure: DateTime<FixedOffset>,
    pub mile_marker: f64,
    pub city: String,
    pub state: String,
}

/// One driving span: a cumulative-mile range and a wall-clock range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrivingSegment {
    pub start_time: DateTime<FixedOffset>,
    pub end_time: DateTime<FixedOffset>,
    pub start_mile: f64,
    pub end_mile: f64,
}

/// An ordered, contiguous sequence of `DutyEvent`s. Construction does not
/// itself check contiguity - that is the Compliance Validator's job - but
/// every producer in this crate appends events starting exactly where the
/// previous one ended.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventTimeline {
    pub events: Vec<DutyEvent>,
}

impl EventTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: DutyEvent) {
        self.events.push(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
