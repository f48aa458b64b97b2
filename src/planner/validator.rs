//! Compliance Validator (C6) - a pure checker, never mutates its inputs.
//!
//! A generated plan is the legal spine of the driver's logbook: if
//! validation fails here, nothing downstream should persist it. Every
//! rule violation carries a rule name, a human message, and the numbers
//! that tripped it, folded into a closed `PlannerError::HOSViolation`
//! rather than an exception hierarchy.

use std::collections::HashMap;

use crate::types::duty::{DutyEvent, EventTimeline};
use crate::types::error::{PlannerError, PlannerResult};
use crate::types::logday::LogDay;
use crate::types::rules::{DutyStatus, RuleConstants};

const TOLERANCE_HOURS: f64 = 0.02;
const BREAK_TOLERANCE_HOURS: f64 = 0.5;
const CONTIGUITY_TOLERANCE_SECONDS: i64 = 60;

fn details(pairs: &[(&str, f64)]) -> HashMap<String, f64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

fn is_qualifying_rest(event: &DutyEvent, rules: &RuleConstants) -> bool {
    matches!(event.status, DutyStatus::OffDuty | DutyStatus::Sleeper)
        && event.duration_hours() >= rules.minimum_rest_hours
}

/// Every event's status is a member of the closed `DutyStatus` enum by
/// construction; this check exists for parity with the original's runtime
/// validation but can never fail in this crate.
fn check_statuses(_timeline: &EventTimeline) -> PlannerResult<()> {
    Ok(())
}

fn check_no_overlap_and_contiguity(timeline: &EventTimeline) -> PlannerResult<()> {
    let mut events: Vec<&DutyEvent> = timeline.events.iter().collect();
    events.sort_by_key(|e| e.start);

    for pair in events.windows(2) {
        let (curr, next) = (pair[0], pair[1]);
        if curr.end > next.start {
            return Err(PlannerError::invalid_sequence(
                "NO_OVERLAP",
                format!(
                    "event ending {} overlaps event starting {}",
                    curr.end, next.start
                ),
                details(&[]),
            ));
        }
        let gap = (next.start - curr.end).num_seconds();
        if gap > CONTIGUITY_TOLERANCE_SECONDS {
            return Err(PlannerError::invalid_sequence(
                "CONTIGUITY",
                format!("gap of {gap}s between {} and {}", curr.end, next.start),
                details(&[("gap_seconds", gap as f64)]),
            ));
        }
    }
    Ok(())
}

fn check_daily_totals(log_days: &[LogDay]) -> PlannerResult<()> {
    for day in log_days {
        let total = day.total_hours();
        if (total - 24.0).abs() > TOLERANCE_HOURS {
            return Err(PlannerError::invalid_sequence(
                "DAILY_TOTAL",
                format!("{} totals {total:.2}h, expected 24.00h", day.date),
                details(&[("total_hours", total), ("expected_hours", 24.0)]),
            ));
        }
    }
    Ok(())
}

fn check_driving_limit(timeline: &EventTimeline, rules: &RuleConstants) -> PlannerResult<()> {
    let mut accumulated = 0.0;
    for event in &timeline.events {
        if is_qualifying_rest(event, rules) {
            accumulated = 0.0;
            continue;
        }
        if event.status == DutyStatus::Driving {
            accumulated += event.duration_hours();
            if accumulated > rules.max_driving_hours + TOLERANCE_HOURS {
                return Err(PlannerError::hos_violation(
                    "11_HOUR_DRIVING",
                    format!(
                        "driving accumulator reached {accumulated:.2}h, limit {}h",
                        rules.max_driving_hours
                    ),
                    details(&[("accumulated_hours", accumulated), ("limit_hours", rules.max_driving_hours)]),
                ));
            }
        }
    }
    Ok(())
}

fn check_on_duty_window(timeline: &EventTimeline, rules: &RuleConstants) -> PlannerResult<()> {
    let mut window_start = None;
    for event in &timeline.events {
        if is_qualifying_rest(event, rules) {
            window_start = None;
            continue;
        }
        if matches!(event.status, DutyStatus::Driving | DutyStatus::OnDuty) && window_start.is_none() {
            window_start = Some(event.start);
        }
        if let Some(start) = window_start {
            if event.status == DutyStatus::Driving {
                let elapsed = (event.end - start).num_milliseconds() as f64 / 3_600_000.0;
                if elapsed > rules.max_on_duty_window + TOLERANCE_HOURS {
                    return Err(PlannerError::hos_violation(
                        "14_HOUR_WINDOW",
                        format!(
                            "on-duty window reached {elapsed:.2}h, limit {}h",
                            rules.max_on_duty_window
                        ),
                        details(&[("elapsed_hours", elapsed), ("limit_hours", rules.max_on_duty_window)]),
                    ));
                }
            }
        }
    }
    Ok(())
}

fn check_mandatory_break(timeline: &EventTimeline, rules: &RuleConstants) -> PlannerResult<()> {
    let mut driving_since_break = 0.0;
    for event in &timeline.events {
        if event.status != DutyStatus::Driving && event.duration_hours() >= 0.5 {
            driving_since_break = 0.0;
            continue;
        }
        if event.status == DutyStatus::Driving {
            driving_since_break += event.duration_hours();
            if driving_since_break > rules.break_required_after_hours + BREAK_TOLERANCE_HOURS {
                return Err(PlannerError::hos_violation(
                    "MANDATORY_BREAK",
                    format!(
                        "driving-since-break reached {driving_since_break:.2}h without a qualifying break"
                    ),
                    details(&[
                        ("accumulated_hours", driving_since_break),
                        ("limit_hours", rules.break_required_after_hours),
                    ]),
                ));
            }
        }
    }
    Ok(())
}

fn check_cycle(timeline: &EventTimeline, current_cycle_used: f64, rules: &RuleConstants) -> PlannerResult<()> {
    let trip_on_duty: f64 = timeline
        .events
        .iter()
        .filter(|e| matches!(e.status, DutyStatus::Driving | DutyStatus::OnDuty))
        .map(|e| e.duration_hours())
        .sum();

    let total = current_cycle_used + trip_on_duty;
    if total > rules.max_cycle_hours {
        return Err(PlannerError::hos_violation(
            "70_HOUR_CYCLE",
            format!(
                "trip brings cycle usage to {total:.2}h, exceeding the {}h limit",
                rules.max_cycle_hours
            ),
            details(&[
                ("current_cycle_hours", current_cycle_used),
                ("trip_on_duty_hours", trip_on_duty),
                ("limit_hours", rules.max_cycle_hours),
            ]),
        ));
    }
    Ok(())
}

/// Run every check. Structural defects (`Invalid`) and regulatory
/// violations (`Violation`) both abort: the orchestrator never persists a
/// plan this function rejects.
pub fn validate(
    timeline: &EventTimeline,
    log_days: &[LogDay],
    current_cycle_used: f64,
    rules: &RuleConstants,
) -> PlannerResult<()> {
    check_statuses(timeline)?;
    check_no_overlap_and_contiguity(timeline)?;
    check_daily_totals(log_days)?;
    check_driving_limit(timeline, rules)?;
    check_on_duty_window(timeline, rules)?;
    check_mandatory_break(timeline, rules)?;
    check_cycle(timeline, current_cycle_used, rules)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, FixedOffset, TimeZone};

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn at(hour: i64, minute: i64) -> DateTime<FixedOffset> {
        let base: DateTime<FixedOffset> = offset().with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        base + chrono::Duration::hours(hour) + chrono::Duration::minutes(minute)
    }

    fn rules() -> RuleConstants {
        RuleConstants::default()
    }

    #[test]
    fn accepts_a_clean_short_trip() {
        let mut timeline = EventTimeline::new();
        timeline.push(DutyEvent::new(at(0, 0), at(1, 0), DutyStatus::OnDuty, "A", "TX", "Pickup"));
        timeline.push(DutyEvent::new(at(1, 0), at(5, 0), DutyStatus::Driving, "A", "TX", "Driving"));
        timeline.push(DutyEvent::new(at(5, 0), at(6, 0), DutyStatus::OnDuty, "B", "TX", "Dropoff"));
        let log_days = crate::planner::logbook::split_into_log_days(&timeline);
        assert!(validate(&timeline, &log_days, 0.0, &rules()).is_ok());
    }

    #[test]
    fn rejects_overlapping_events() {
        let mut timeline = EventTimeline::new();
        timeline.push(DutyEvent::new(at(0, 0), at(2, 0), DutyStatus::Driving, "A", "TX", "Driving"));
        timeline.push(DutyEvent::new(at(1, 0), at(3, 0), DutyStatus::Driving, "A", "TX", "Driving"));
        let result = check_no_overlap_and_contiguity(&timeline);
        assert!(matches!(
            result,
            Err(PlannerError::InvalidSequence { ref check, .. }) if check == "NO_OVERLAP"
        ));
    }

    #[test]
    fn rejects_driving_past_eleven_hours_without_rest() {
        let mut timeline = EventTimeline::new();
        timeline.push(DutyEvent::new(at(0, 0), at(12, 0), DutyStatus::Driving, "A", "TX", "Driving"));
        let result = check_driving_limit(&timeline, &rules());
        assert!(matches!(
            result,
            Err(PlannerError::HOSViolation { ref rule, .. }) if rule == "11_HOUR_DRIVING"
        ));
    }

    #[test]
    fn ten_hour_rest_resets_driving_accumulator() {
        let mut timeline = EventTimeline::new();
        timeline.push(DutyEvent::new(at(0, 0), at(10, 0), DutyStatus::Driving, "A", "TX", "Driving"));
        timeline.push(DutyEvent::new(at(10, 0), at(20, 0), DutyStatus::Sleeper, "A", "TX", "Rest"));
        timeline.push(DutyEvent::new(at(20, 0), at(22, 0), DutyStatus::Driving, "A", "TX", "Driving"));
        assert!(check_driving_limit(&timeline, &rules()).is_ok());
    }

    #[test]
    fn rejects_cycle_overrun() {
        let mut timeline = EventTimeline::new();
        timeline.push(DutyEvent::new(at(0, 0), at(5, 0), DutyStatus::Driving, "A", "TX", "Driving"));
        let result = check_cycle(&timeline, 68.0, &rules());
        assert!(matches!(
            result,
            Err(PlannerError::HOSViolation { ref rule, .. }) if rule == "70_HOUR_CYCLE"
        ));
    }
}
