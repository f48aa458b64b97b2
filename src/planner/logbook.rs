//! Logbook Transformer (C5) - turns a contiguous `EventTimeline` into
//! per-calendar-day `LogDay`s.
//!
//! Three passes: split any event crossing local midnight at the
//! boundary, bucket the resulting pieces by date, then fill the gaps in
//! each day with OFF_DUTY and total the four duty statuses. Splitting
//! loops rather than handling a single midnight crossing, since a rest
//! or fuel stop can span more than 24 hours.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

use crate::types::duty::{DutyEvent, EventTimeline};
use crate::types::logday::LogDay;
use crate::types::rules::DutyStatus;

fn next_local_midnight(dt: DateTime<FixedOffset>) -> DateTime<FixedOffset> {
    let next_date = dt.date_naive().succ_opt().expect("date overflow");
    dt.offset()
        .from_local_datetime(&next_date.and_hms_opt(0, 0, 0).unwrap())
        .single()
        .expect("FixedOffset never produces an ambiguous local time")
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<FixedOffset> {
    offset
        .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
        .single()
        .expect("FixedOffset never produces an ambiguous local time")
}

/// Split every event crossing local midnight into one part per calendar
/// date it touches. A part that is followed by another (it ends at a
/// midnight short of the event's true end) gets `" (cont'd)"` appended; a
/// part that follows another (it starts exactly at midnight) gets
/// `" (cont'd from prev day)"` appended. A middle part of an event
/// spanning more than two days gets both.
fn split_midnight_crossings(events: &[DutyEvent]) -> Vec<DutyEvent> {
    let mut out = Vec::new();
    for event in events {
        if event.start.date_naive() == event.end.date_naive() {
            out.push(event.clone());
            continue;
        }

        let mut cur_start = event.start;
        let mut first = true;
        loop {
            let midnight = next_local_midnight(cur_start);
            let is_last = midnight >= event.end;
            let part_end = if is_last { event.end } else { midnight };

            let mut remark = event.remark.clone();
            if !first {
                remark = format!("{remark} (cont'd from prev day)");
            }
            if !is_last {
                remark = format!("{remark} (cont'd)");
            }

            out.push(DutyEvent::new(
                cur_start,
                part_end,
                event.status,
                event.city.clone(),
                event.state.clone(),
                remark,
            ));

            if is_last {
                break;
            }
            cur_start = midnight;
            first = false;
        }
    }
    out
}

/// Bucket midnight-split events by their start date, in date order.
fn bucket_by_date(events: Vec<DutyEvent>) -> BTreeMap<NaiveDate, Vec<DutyEvent>> {
    let mut buckets: BTreeMap<NaiveDate, Vec<DutyEvent>> = BTreeMap::new();
    for event in events {
        buckets.entry(event.start.date_naive()).or_default().push(event);
    }
    for segments in buckets.values_mut() {
        segments.sort_by_key(|e| e.start);
    }
    buckets
}

/// Fill `[00:00, first.start)`, every inter-segment gap, and
/// `(last.end, 24:00]` with OFF_DUTY, inheriting the adjacent segment's
/// city/state (the segment before the gap; the first segment's for the
/// leading gap).
fn fill_gaps(date: NaiveDate, segments: Vec<DutyEvent>) -> Vec<DutyEvent> {
    let Some(first) = segments.first() else {
        return segments;
    };
    let offset = *first.start.offset();
    let day_start = local_midnight(date, offset);
    let day_end = next_local_midnight(day_start);

    let mut filled = Vec::with_capacity(segments.len() + 2);
    let mut cursor = day_start;

    for (i, segment) in segments.iter().enumerate() {
        if segment.start > cursor {
            let (city, state) = if i == 0 {
                (first.city.clone(), first.state.clone())
            } else {
                let prev = &segments[i - 1];
                (prev.city.clone(), prev.state.clone())
            };
            filled.push(DutyEvent::new(cursor, segment.start, DutyStatus::OffDuty, city, state, "Off duty"));
        }
        filled.push(segment.clone());
        cursor = segment.end;
    }

    if cursor < day_end {
        let last = segments.last().expect("non-empty segments checked above");
        filled.push(DutyEvent::new(
            cursor,
            day_end,
            DutyStatus::OffDuty,
            last.city.clone(),
            last.state.clone(),
            "Off duty",
        ));
    }

    filled
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn daily_totals(segments: &[DutyEvent]) -> (f64, f64, f64, f64) {
    let mut driving = 0.0;
    let mut on_duty = 0.0;
    let mut off_duty = 0.0;
    let mut sleeper = 0.0;
    for segment in segments {
        match segment.status {
            DutyStatus::Driving => driving += segment.duration_hours(),
            DutyStatus::OnDuty => on_duty += segment.duration_hours(),
            DutyStatus::OffDuty => off_duty += segment.duration_hours(),
            DutyStatus::Sleeper => sleeper += segment.duration_hours(),
        }
    }
    (round2(driving), round2(on_duty), round2(off_duty), round2(sleeper))
}

/// Transform a contiguous timeline into ordered, gap-filled `LogDay`s with
/// daily totals.
pub fn split_into_log_days(timeline: &EventTimeline) -> Vec<LogDay> {
    let split = split_midnight_crossings(&timeline.events);
    let buckets = bucket_by_date(split);

    buckets
        .into_iter()
        .map(|(date, segments)| {
            let segments = fill_gaps(date, segments);
            let (total_driving_hours, total_on_duty_hours, total_off_duty_hours, total_sleeper_hours) =
                daily_totals(&segments);
            LogDay {
                date,
                segments,
                total_driving_hours,
                total_on_duty_hours,
                total_off_duty_hours,
                total_sleeper_hours,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(5 * 3600).unwrap()
    }

    fn at(date: &str, time: &str) -> DateTime<FixedOffset> {
        let naive = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_time(chrono::NaiveTime::parse_from_str(time, "%H:%M").unwrap());
        offset().from_local_datetime(&naive).unwrap()
    }

    #[test]
    fn single_day_timeline_gets_gap_filled_front_and_back() {
        let mut timeline = EventTimeline::new();
        timeline.push(DutyEvent::new(
            at("2026-03-01", "08:00"),
            at("2026-03-01", "10:00"),
            DutyStatus::Driving,
            "Dallas",
            "TX",
            "Driving",
        ));
        let days = split_into_log_days(&timeline);
        assert_eq!(days.len(), 1);
        let day = &days[0];
        assert_eq!(day.segments.len(), 3);
        assert_eq!(day.segments[0].status, DutyStatus::OffDuty);
        assert_eq!(day.segments[2].status, DutyStatus::OffDuty);
        assert!((day.total_hours() - 24.0).abs() < 0.02);
    }

    #[test]
    fn event_crossing_midnight_splits_into_two_days() {
        let mut timeline = EventTimeline::new();
        timeline.push(DutyEvent::new(
            at("2026-03-01", "22:00"),
            at("2026-03-02", "04:00"),
            DutyStatus::Sleeper,
            "Dallas",
            "TX",
            "10-hour rest",
        ));
        let days = split_into_log_days(&timeline);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        let tail = days[1]
            .segments
            .iter()
            .find(|s| s.status == DutyStatus::Sleeper)
            .unwrap();
        assert!(tail.remark.ends_with("(cont'd from prev day)"));
    }

    #[test]
    fn event_spanning_multiple_days_splits_into_one_part_per_day() {
        let mut timeline = EventTimeline::new();
        timeline.push(DutyEvent::new(
            at("2026-03-01", "06:00"),
            at("2026-03-01", "06:00") + Duration::hours(50),
            DutyStatus::OffDuty,
            "Dallas",
            "TX",
            "Extended layover",
        ));
        let days = split_into_log_days(&timeline);
        assert_eq!(days.len(), 3);
    }

    #[test]
    fn daily_totals_sum_to_twenty_four_hours() {
        let mut timeline = EventTimeline::new();
        timeline.push(DutyEvent::new(
            at("2026-03-01", "06:00"),
            at("2026-03-01", "07:00"),
            DutyStatus::OnDuty,
            "Dallas",
            "TX",
            "Pickup",
        ));
        timeline.push(DutyEvent::new(
            at("2026-03-01", "07:00"),
            at("2026-03-01", "14:00"),
            DutyStatus::Driving,
            "Dallas",
            "TX",
            "Driving",
        ));
        let days = split_into_log_days(&timeline);
        let day = &days[0];
        assert_eq!(day.total_on_duty_hours, 1.0);
        assert_eq!(day.total_driving_hours, 7.0);
        assert!((day.total_hours() - 24.0).abs() < 0.02);
    }
}
