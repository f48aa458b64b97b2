//! Planner orchestrator (C7) - composes C2 (geo) -> C4 (stop planner) ->
//! C5 (logbook transformer) -> C6 (compliance validator) into one call.
//!
//! The two-leg routing decision: if the pickup location is textually the
//! same as the current location, route directly; otherwise route
//! origin->pickup, then pickup->dropoff starting from the first leg's
//! end time, concatenating both outputs. There is no persistence layer
//! here: this orchestrator returns a `PersistencePlan`
//! value and performs no I/O beyond the C2 geo calls.

use chrono::{DateTime, FixedOffset, Utc};

use crate::services::GeoProvider;
use crate::types::duty::{DrivingSegment, DutyEvent, EventTimeline, Stop};
use crate::types::error::{PlannerError, PlannerResult};
use crate::types::geo::Place;
use crate::types::logday::LogDay;
use crate::types::rules::{DutyStatus, RuleConstants};
use crate::types::trip::TripRequest;

use super::logbook;
use super::stop_planner::{plan_stops, StopPlanInput, StopPlanOutput};
use super::validator;

/// What the orchestrator hands back to the caller to persist: the
/// per-day log sheets, trip-level totals, a flat stop list, and the
/// driving segments underlying those totals, for reporting and UI.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PersistencePlan {
    pub log_days: Vec<LogDay>,
    pub stops: Vec<Stop>,
    pub driving_segments: Vec<DrivingSegment>,
    pub total_miles: f64,
    pub total_driving_hours: f64,
    pub total_trip_hours: f64,
}

pub struct PlannerOrchestrator<'a> {
    geo: &'a GeoProvider,
    rules: &'a RuleConstants,
}

fn rebase_stops(stops: Vec<Stop>, offset_miles: f64) -> Vec<Stop> {
    stops
        .into_iter()
        .map(|mut stop| {
            stop.mile_marker += offset_miles;
            stop
        })
        .collect()
}

fn rebase_segments(segments: Vec<DrivingSegment>, offset_miles: f64) -> Vec<DrivingSegment> {
    segments
        .into_iter()
        .map(|mut segment| {
            segment.start_mile += offset_miles;
            segment.end_mile += offset_miles;
            segment
        })
        .collect()
}

impl<'a> PlannerOrchestrator<'a> {
    pub fn new(geo: &'a GeoProvider, rules: &'a RuleConstants) -> Self {
        Self { geo, rules }
    }

    /// `estimated_trip_hours = total_miles / average_speed_mph + pickup +
    /// dropoff`, the projected on-duty total for the whole trip. Rejects
    /// outright, before any stop is planned, when the driver doesn't have
    /// that many hours left in the 70-hour cycle.
    fn estimate_trip_on_duty_hours(&self, total_miles: f64, average_speed_mph: f64) -> f64 {
        total_miles / average_speed_mph + self.rules.pickup_duration_hours + self.rules.dropoff_duration_hours
    }

    fn check_cycle_availability(&self, current_cycle_hours: f64, estimated_trip_hours: f64) -> PlannerResult<()> {
        let hours_remaining = self.rules.max_cycle_hours - current_cycle_hours;
        if estimated_trip_hours > hours_remaining {
            return Err(PlannerError::hos_violation(
                "70_HOUR_CYCLE",
                format!(
                    "trip requires ~{estimated_trip_hours:.2}h but only {hours_remaining:.2}h remain in the 70-hour cycle"
                ),
                [
                    ("current_cycle_hours".to_string(), current_cycle_hours),
                    ("hours_remaining".to_string(), hours_remaining),
                    ("estimated_trip_hours".to_string(), estimated_trip_hours),
                ]
                .into_iter()
                .collect(),
            ));
        }
        Ok(())
    }

    pub async fn plan(&self, request: &TripRequest) -> PlannerResult<PersistencePlan> {
        if let Some(total_miles) = request.total_miles {
            let estimate = self.estimate_trip_on_duty_hours(total_miles as f64, request.average_speed_mph);
            self.check_cycle_availability(request.current_cycle_used_hours, estimate)?;
        }

        let origin = self.geo.geocode(&request.current_location).await?;
        let pickup = self.geo.geocode(&request.pickup_location).await?;
        let dropoff = self.geo.geocode(&request.dropoff_location).await?;

        let start_time: DateTime<FixedOffset> = request
            .planned_start_time
            .unwrap_or_else(|| Utc::now().with_timezone(&FixedOffset::east_opt(0).unwrap()));

        let same_start = request.pickup_location.trim().eq_ignore_ascii_case(request.current_location.trim());

        let (mut timeline, mut stops, mut driving_segments, total_miles) = if same_start {
            let route = self.geo.route(origin, dropoff.clone()).await?;
            let distance_miles = route.distance_miles();
            let estimate = self.estimate_trip_on_duty_hours(distance_miles, request.average_speed_mph);
            self.check_cycle_availability(request.current_cycle_used_hours, estimate)?;

            let output = self.run_leg(&route, request, start_time, request.current_cycle_used_hours, true, true).await?;
            (output.timeline, output.stops, output.segments, distance_miles)
        } else {
            let leg1_route = self.geo.route(origin, pickup.clone()).await?;
            let leg1_distance = leg1_route.distance_miles();
            let leg2_route = self.geo.route(pickup, dropoff.clone()).await?;
            let leg2_distance = leg2_route.distance_miles();

            let estimate = self.estimate_trip_on_duty_hours(leg1_distance + leg2_distance, request.average_speed_mph);
            self.check_cycle_availability(request.current_cycle_used_hours, estimate)?;

            let leg1 = self
                .run_leg(&leg1_route, request, start_time, request.current_cycle_used_hours, false, false)
                .await?;
            let leg2 = self
                .run_leg(&leg2_route, request, leg1.final_time, leg1.final_cycle_hours_used, true, true)
                .await?;

            let mut timeline = EventTimeline::new();
            for event in leg1.timeline.events {
                timeline.push(event);
            }
            for event in leg2.timeline.events {
                timeline.push(event);
            }

            let mut stops = leg1.stops;
            stops.extend(rebase_stops(leg2.stops, leg1_distance));

            let mut driving_segments = leg1.segments;
            driving_segments.extend(rebase_segments(leg2.segments, leg1_distance));

            (timeline, stops, driving_segments, leg1_distance + leg2_distance)
        };

        self.append_final_rest(&mut timeline, &dropoff);

        let log_days = logbook::split_into_log_days(&timeline);
        validator::validate(&timeline, &log_days, request.current_cycle_used_hours, self.rules)?;

        let total_driving_hours: f64 = timeline
            .events
            .iter()
            .filter(|e| e.status == DutyStatus::Driving)
            .map(|e| e.duration_hours())
            .sum();
        let total_trip_hours = timeline
            .events
            .first()
            .zip(timeline.events.last())
            .map(|(first, last)| (last.end - first.start).num_milliseconds() as f64 / 3_600_000.0)
            .unwrap_or(0.0);

        stops.sort_by_key(|s| s.scheduled_arrival);
        driving_segments.sort_by(|a, b| a.start_mile.total_cmp(&b.start_mile));

        Ok(PersistencePlan {
            log_days,
            stops,
            driving_segments,
            total_miles,
            total_driving_hours,
            total_trip_hours,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_leg(
        &self,
        route: &crate::types::route::Route,
        request: &TripRequest,
        start_time: DateTime<FixedOffset>,
        current_cycle_hours: f64,
        include_pickup: bool,
        include_dropoff: bool,
    ) -> PlannerResult<StopPlanOutput> {
        plan_stops(
            StopPlanInput {
                route,
                start_time,
                current_cycle_hours,
                average_speed_mph: request.average_speed_mph,
                include_pickup,
                include_dropoff,
                skip_reverse_geocoding: request.skip_reverse_geocoding,
            },
            self.rules,
            self.geo,
        )
        .await
    }

    /// A single OFF_DUTY rest of `minimum_rest_hours` is appended once, at
    /// the destination, after the full (possibly two-leg) trip - never
    /// per leg. It is deliberately excluded from `cycle_hours_used`/the
    /// cycle check, since OFF_DUTY time is never on-duty time.
    fn append_final_rest(&self, timeline: &mut EventTimeline, dropoff: &Place) {
        let Some(last) = timeline.events.last() else {
            return;
        };
        let start = last.end;
        let end = start + chrono::Duration::minutes((self.rules.minimum_rest_hours * 60.0) as i64);
        timeline.push(DutyEvent::new(
            start,
            end,
            DutyStatus::OffDuty,
            dropoff.city.clone(),
            dropoff.state.clone(),
            "Trip complete - off duty",
        ));
    }
}
