//! Stop Planner (C4) - the core state machine.
//!
//! Walks a route by distance, interleaving driving blocks with mandatory
//! breaks, 10-hour rests, and fuel stops, respecting four simultaneously
//! enforced counters. Rather than a chain of sequential if/continue
//! checks, each counter reports its own remaining headroom and the
//! smallest one picks the next forced stop, with a fixed tie-break order
//! when more than one counter bottoms out at once.

use chrono::{DateTime, FixedOffset};

use crate::types::duty::{DrivingSegment, DutyEvent, EventTimeline, Stop};
use crate::types::error::{PlannerError, PlannerResult};
use crate::types::route::Route;
use crate::types::rules::RuleConstants;

const EPSILON_HOURS: f64 = 0.01;
const EPSILON_MILES: f64 = 1.0;
const METERS_PER_MILE: f64 = 1609.344;

pub struct StopPlanInput<'a> {
    pub route: &'a Route,
    pub start_time: DateTime<FixedOffset>,
    pub current_cycle_hours: f64,
    pub average_speed_mph: f64,
    pub include_pickup: bool,
    pub include_dropoff: bool,
    pub skip_reverse_geocoding: bool,
}

pub struct StopPlanOutput {
    pub stops: Vec<Stop>,
    pub segments: Vec<DrivingSegment>,
    pub timeline: EventTimeline,
    pub final_time: DateTime<FixedOffset>,
    pub final_cycle_hours_used: f64,
    pub total_trip_hours: f64,
}

/// Internal, transient state owned exclusively by one call to
/// `plan_stops`. Driving time is tracked with two separate counters
/// (`driving_since_break`/`driving_today`) since the break and
/// driving-limit clocks reset on different events.
struct PlannerState {
    current_time: DateTime<FixedOffset>,
    miles_remaining: f64,
    driving_since_break: f64,
    driving_today: f64,
    miles_since_fuel: f64,
    window_start: Option<DateTime<FixedOffset>>,
    cycle_hours_used: f64,
}

impl PlannerState {
    fn hours_since_window_start(&self) -> f64 {
        match self.window_start {
            Some(start) => (self.current_time - start).num_milliseconds() as f64 / 3_600_000.0,
            None => 0.0,
        }
    }
}

/// Reverse-geocode (or placeholder) a position reached at the given
/// cumulative mile mark.
async fn locate(
    route: &Route,
    current_miles: f64,
    skip_reverse_geocoding: bool,
    geo: &crate::services::GeoProvider,
) -> (String, String) {
    if skip_reverse_geocoding {
        return ("En Route".to_string(), String::new());
    }
    let point = route.interpolate(current_miles * METERS_PER_MILE);
    geo.reverse_geocode(point).await
}

/// Run the full state machine for one route leg.
pub async fn plan_stops(
    input: StopPlanInput<'_>,
    rules: &RuleConstants,
    geo: &crate::services::GeoProvider,
) -> PlannerResult<StopPlanOutput> {
    let route = input.route;
    let distance_miles = route.distance_miles();

    let mut stops = Vec::new();
    let mut segments = Vec::new();
    let mut timeline = EventTimeline::new();

    let mut state = PlannerState {
        current_time: input.start_time,
        miles_remaining: distance_miles,
        driving_since_break: 0.0,
        driving_today: 0.0,
        miles_since_fuel: 0.0,
        window_start: None,
        cycle_hours_used: input.current_cycle_hours,
    };
    let mut current_miles = 0.0_f64;

    // ------------------------------------------------------------------
    // Phase 1 - Pickup
    // ------------------------------------------------------------------
    if input.include_pickup {
        let arrival = state.current_time;
        let departure = arrival + chrono::Duration::minutes((rules.pickup_duration_hours * 60.0) as i64);
        let (city, region) = (route.origin.city.clone(), route.origin.state.clone());

        stops.push(Stop {
            stop_type: crate::types::rules::StopType::Pickup,
            scheduled_arrival: arrival,
            scheduled_departure: departure,
            mile_marker: 0.0,
            city: city.clone(),
            state: region.clone(),
        });
        timeline.push(DutyEvent::new(
            arrival,
            departure,
            crate::types::rules::DutyStatus::OnDuty,
            city,
            region,
            "Pickup - loading and inspection",
        ));

        state.current_time = departure;
        state.window_start = Some(arrival);
        state.cycle_hours_used += rules.pickup_duration_hours;
    }

    // ------------------------------------------------------------------
    // Phase 2 - Drive loop
    // ------------------------------------------------------------------
    if state.window_start.is_none() {
        state.window_start = Some(state.current_time);
    }

    while state.miles_remaining > EPSILON_MILES / 10.0 {
        let hours_to_destination = state.miles_remaining / input.average_speed_mph;

        let h_break = rules.break_required_after_hours - state.driving_since_break;
        let h_day = rules.max_driving_hours - state.driving_today;
        let h_window = rules.max_on_duty_window - state.hours_since_window_start();
        let h_fuel = (rules.fuel_interval_miles - state.miles_since_fuel) / input.average_speed_mph;

        let rule_exhausted =
            h_break <= EPSILON_HOURS || h_day <= EPSILON_HOURS || h_window <= EPSILON_HOURS || h_fuel <= EPSILON_HOURS;

        let drive_hours = if rule_exhausted {
            0.0
        } else {
            [
                hours_to_destination,
                h_break,
                h_day,
                h_window,
                h_fuel,
                rules.max_continuous_driving_hours,
            ]
            .into_iter()
            .fold(f64::INFINITY, f64::min)
        };

        if drive_hours > EPSILON_HOURS {
            let drive_start = state.current_time;
            let drive_end = drive_start + chrono::Duration::milliseconds((drive_hours * 3_600_000.0) as i64);
            let miles_this_block = drive_hours * input.average_speed_mph;
            let (city, region) = locate(route, current_miles, input.skip_reverse_geocoding, geo).await;

            timeline.push(DutyEvent::new(
                drive_start,
                drive_end,
                crate::types::rules::DutyStatus::Driving,
                city,
                region,
                format!("Driving ({miles_this_block:.0} miles)"),
            ));
            segments.push(DrivingSegment {
                start_time: drive_start,
                end_time: drive_end,
                start_mile: current_miles,
                end_mile: current_miles + miles_this_block,
            });

            state.current_time = drive_end;
            state.driving_since_break += drive_hours;
            state.driving_today += drive_hours;
            state.miles_since_fuel += miles_this_block;
            state.cycle_hours_used += drive_hours;
            state.miles_remaining -= miles_this_block;
            current_miles += miles_this_block;
            continue;
        }

        if !rule_exhausted {
            // The only binding constraint was proximity to the
            // destination (hours_to_destination <= EPSILON_HOURS) - finish
            // the leg rather than manufacture a stop for a fraction of a
            // mile.
            let drive_start = state.current_time;
            let drive_end =
                drive_start + chrono::Duration::milliseconds((hours_to_destination * 3_600_000.0) as i64);
            let miles_this_block = state.miles_remaining;
            let (city, region) = locate(route, current_miles, input.skip_reverse_geocoding, geo).await;

            timeline.push(DutyEvent::new(
                drive_start,
                drive_end,
                crate::types::rules::DutyStatus::Driving,
                city,
                region,
                format!("Driving ({miles_this_block:.0} miles)"),
            ));
            segments.push(DrivingSegment {
                start_time: drive_start,
                end_time: drive_end,
                start_mile: current_miles,
                end_mile: current_miles + miles_this_block,
            });

            state.current_time = drive_end;
            state.cycle_hours_used += hours_to_destination;
            current_miles += miles_this_block;
            state.miles_remaining = 0.0;
            continue;
        }

        // Exactly one forced stop, priority REST > BREAK > FUEL.
        let (city, region) = locate(route, current_miles, input.skip_reverse_geocoding, geo).await;

        if state.driving_today >= rules.max_driving_hours - EPSILON_HOURS
            || state.hours_since_window_start() >= rules.max_on_duty_window - EPSILON_HOURS
        {
            let arrival = state.current_time;
            let departure = arrival + chrono::Duration::minutes((rules.minimum_rest_hours * 60.0) as i64);
            stops.push(Stop {
                stop_type: crate::types::rules::StopType::Rest,
                scheduled_arrival: arrival,
                scheduled_departure: departure,
                mile_marker: current_miles,
                city: city.clone(),
                state: region.clone(),
            });
            timeline.push(DutyEvent::new(
                arrival,
                departure,
                crate::types::rules::DutyStatus::Sleeper,
                city,
                region,
                "10-hour rest",
            ));
            state.current_time = departure;
            state.driving_since_break = 0.0;
            state.driving_today = 0.0;
            state.window_start = Some(departure);
        } else if state.driving_since_break >= rules.break_required_after_hours - EPSILON_HOURS {
            let arrival = state.current_time;
            let departure =
                arrival + chrono::Duration::minutes((rules.break_duration_minutes) as i64);
            stops.push(Stop {
                stop_type: crate::types::rules::StopType::Break,
                scheduled_arrival: arrival,
                scheduled_departure: departure,
                mile_marker: current_miles,
                city: city.clone(),
                state: region.clone(),
            });
            timeline.push(DutyEvent::new(
                arrival,
                departure,
                crate::types::rules::DutyStatus::OffDuty,
                city,
                region,
                "30-minute break",
            ));
            state.current_time = departure;
            state.driving_since_break = 0.0;
        } else if state.miles_since_fuel >= rules.fuel_interval_miles - EPSILON_MILES {
            let arrival = state.current_time;
            let departure =
                arrival + chrono::Duration::minutes((rules.fuel_stop_duration_minutes) as i64);
            stops.push(Stop {
                stop_type: crate::types::rules::StopType::Fuel,
                scheduled_arrival: arrival,
                scheduled_departure: departure,
                mile_marker: current_miles,
                city: city.clone(),
                state: region.clone(),
            });
            timeline.push(DutyEvent::new(
                arrival,
                departure,
                crate::types::rules::DutyStatus::OnDuty,
                city,
                region,
                "Fuel stop",
            ));
            state.current_time = departure;
            state.miles_since_fuel = 0.0;
            state.cycle_hours_used += rules.fuel_stop_duration_hours();
        } else {
            return Err(PlannerError::Internal {
                message: "drive block proposed with all headrooms exhausted but no priority rule matched"
                    .to_string(),
            });
        }
    }

    // ------------------------------------------------------------------
    // Phase 3 - Dropoff
    // ------------------------------------------------------------------
    if input.include_dropoff {
        let arrival = state.current_time;
        let departure = arrival + chrono::Duration::minutes((rules.dropoff_duration_hours * 60.0) as i64);
        let (city, region) = (route.destination.city.clone(), route.destination.state.clone());

        stops.push(Stop {
            stop_type: crate::types::rules::StopType::Dropoff,
            scheduled_arrival: arrival,
            scheduled_departure: departure,
            mile_marker: distance_miles,
            city: city.clone(),
            state: region.clone(),
        });
        timeline.push(DutyEvent::new(
            arrival,
            departure,
            crate::types::rules::DutyStatus::OnDuty,
            city,
            region,
            "Dropoff - unloading and paperwork",
        ));

        state.current_time = departure;
        state.cycle_hours_used += rules.dropoff_duration_hours;
    }

    let total_trip_hours = (state.current_time - input.start_time).num_milliseconds() as f64 / 3_600_000.0;

    Ok(StopPlanOutput {
        stops,
        segments,
        timeline,
        final_time: state.current_time,
        final_cycle_hours_used: state.cycle_hours_used,
        total_trip_hours,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::geocoding::MockGeocoder;
    use crate::services::routing::MockRoutingProvider;
    use crate::services::GeoProvider;
    use crate::types::geo::Place;
    use crate::types::rules::StopType;
    use chrono::TimeZone;

    fn geo() -> GeoProvider {
        GeoProvider::new(Box::new(MockGeocoder::new()), Box::new(MockRoutingProvider::new()))
    }

    fn place(lat: f64, lng: f64, city: &str) -> Place {
        Place {
            point: crate::types::geo::GeoPoint::new(lat, lng),
            city: city.to_string(),
            state: "TX".to_string(),
        }
    }

    /// A straight route `miles` long, built from two widely-spaced
    /// vertices so `interpolate` has real distance to walk.
    fn route_of_length(miles: f64) -> Route {
        let degrees = miles / 69.0; // ~69 miles per degree of latitude
        Route {
            distance_meters: miles * METERS_PER_MILE,
            duration_seconds: 0.0,
            geometry: vec![
                crate::types::geo::GeoPoint::new(30.0, -97.0),
                crate::types::geo::GeoPoint::new(30.0 + degrees, -97.0),
            ],
            origin: place(30.0, -97.0, "Origin"),
            destination: place(30.0 + degrees, -97.0, "Destination"),
        }
    }

    fn start_time() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600).unwrap().with_ymd_and_hms(2026, 3, 1, 6, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn short_trip_needs_no_forced_stops() {
        let route = route_of_length(200.0);
        let rules = RuleConstants::default();
        let geo = geo();
        let output = plan_stops(
            StopPlanInput {
                route: &route,
                start_time: start_time(),
                current_cycle_hours: 0.0,
                average_speed_mph: 55.0,
                include_pickup: true,
                include_dropoff: true,
                skip_reverse_geocoding: true,
            },
            &rules,
            &geo,
        )
        .await
        .unwrap();

        assert_eq!(output.stops.len(), 2); // pickup, dropoff only
        assert!(matches!(output.stops[0].stop_type, StopType::Pickup));
        assert!(matches!(output.stops[1].stop_type, StopType::Dropoff));
    }

    #[tokio::test]
    async fn long_trip_inserts_break_before_driving_limit() {
        let route = route_of_length(500.0);
        let rules = RuleConstants::default();
        let geo = geo();
        let output = plan_stops(
            StopPlanInput {
                route: &route,
                start_time: start_time(),
                current_cycle_hours: 0.0,
                average_speed_mph: 55.0,
                include_pickup: false,
                include_dropoff: false,
                skip_reverse_geocoding: true,
            },
            &rules,
            &geo,
        )
        .await
        .unwrap();

        assert!(output.stops.iter().any(|s| matches!(s.stop_type, StopType::Break)));
    }

    #[tokio::test]
    async fn trip_past_eleven_hours_driving_inserts_a_rest() {
        let route = route_of_length(700.0);
        let rules = RuleConstants::default();
        let geo = geo();
        let output = plan_stops(
            StopPlanInput {
                route: &route,
                start_time: start_time(),
                current_cycle_hours: 0.0,
                average_speed_mph: 55.0,
                include_pickup: false,
                include_dropoff: false,
                skip_reverse_geocoding: true,
            },
            &rules,
            &geo,
        )
        .await
        .unwrap();

        assert!(output.stops.iter().any(|s| matches!(s.stop_type, StopType::Rest)));
    }

    #[tokio::test]
    async fn fuel_stop_inserted_past_thousand_miles() {
        let route = route_of_length(1100.0);
        let rules = RuleConstants::default();
        let geo = geo();
        let output = plan_stops(
            StopPlanInput {
                route: &route,
                start_time: start_time(),
                current_cycle_hours: 0.0,
                average_speed_mph: 60.0,
                include_pickup: false,
                include_dropoff: false,
                skip_reverse_geocoding: true,
            },
            &rules,
            &geo,
        )
        .await
        .unwrap();

        assert!(output.stops.iter().any(|s| matches!(s.stop_type, StopType::Fuel)));
    }

    #[tokio::test]
    async fn timeline_events_are_strictly_contiguous() {
        let route = route_of_length(900.0);
        let rules = RuleConstants::default();
        let geo = geo();
        let output = plan_stops(
            StopPlanInput {
                route: &route,
                start_time: start_time(),
                current_cycle_hours: 0.0,
                average_speed_mph: 55.0,
                include_pickup: true,
                include_dropoff: true,
                skip_reverse_geocoding: true,
            },
            &rules,
            &geo,
        )
        .await
        .unwrap();

        for pair in output.timeline.events.windows(2) {
            assert_eq!(pair[0].end, pair[1].start);
        }
    }
}
