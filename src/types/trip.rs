//! `TripRequest` - the closed, validated input to the planning pipeline.
//!
//! Replaces a loosely-typed dict threaded between layers with one struct
//! whose fields are bounds-checked at construction, so nothing downstream
//! has to re-validate `average_speed_mph` and friends.

use chrono::{DateTime, FixedOffset};

use super::error::{PlannerError, PlannerResult};

#[derive(Debug, Clone)]
pub struct TripRequest {
    pub driver_id: String,
    pub current_cycle_used_hours: f64,
    pub current_location: String,
    pub pickup_location: String,
    pub dropoff_location: String,
    pub total_miles: Option<u32>,
    pub average_speed_mph: f64,
    pub planned_start_time: Option<DateTime<FixedOffset>>,
    pub skip_reverse_geocoding: bool,
}

impl TripRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        driver_id: impl Into<String>,
        current_cycle_used_hours: f64,
        current_location: impl Into<String>,
        pickup_location: impl Into<String>,
        dropoff_location: impl Into<String>,
        total_miles: Option<u32>,
        average_speed_mph: f64,
        planned_start_time: Option<DateTime<FixedOffset>>,
    ) -> PlannerResult<Self> {
        let request = Self {
            driver_id: driver_id.into(),
            current_cycle_used_hours,
            current_location: current_location.into(),
            pickup_location: pickup_location.into(),
            dropoff_location: dropoff_location.into(),
            total_miles,
            average_speed_mph,
            planned_start_time,
            skip_reverse_geocoding: false,
        };
        request.validate()?;
        Ok(request)
    }

    fn validate(&self) -> PlannerResult<()> {
        let err = |message: &str| {
            Err(PlannerError::InputValidation {
                message: message.to_string(),
            })
        };

        if self.driver_id.trim().is_empty() {
            return err("driver_id is required");
        }
        if !(0.0..=70.0).contains(&self.current_cycle_used_hours) {
            return err("current_cycle_used_hours must be between 0 and 70");
        }
        if let Some(miles) = self.total_miles {
            if miles == 0 {
                return err("total_miles must be positive if provided");
            }
            if miles > 5000 {
                return err("total_miles seems unrealistic (max 5000 miles)");
            }
        }
        if !(30.0..=80.0).contains(&self.average_speed_mph) {
            return err("average_speed_mph must be between 30 and 80");
        }
        if self.current_location.trim().is_empty() {
            return err("current_location is required");
        }
        if self.pickup_location.trim().is_empty() {
            return err("pickup_location is required");
        }
        if self.dropoff_location.trim().is_empty() {
            return err("dropoff_location is required");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_request() -> PlannerResult<TripRequest> {
        TripRequest::new("driver-1", 20.0, "Dallas, TX", "Dallas, TX", "Miami, FL", Some(1200), 55.0, None)
    }

    #[test]
    fn accepts_valid_request() {
        assert!(ok_request().is_ok());
    }

    #[test]
    fn rejects_cycle_hours_out_of_range() {
        let result = TripRequest::new("driver-1", 71.0, "A", "A", "B", None, 55.0, None);
        assert!(matches!(result, Err(PlannerError::InputValidation { .. })));
    }

    #[test]
    fn rejects_zero_total_miles() {
        let result = TripRequest::new("driver-1", 10.0, "A", "A", "B", Some(0), 55.0, None);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_speed_outside_narrowed_bounds() {
        let result = TripRequest::new("driver-1", 10.0, "A", "A", "B", None, 90.0, None);
        assert!(result.is_err());
        let result = TripRequest::new("driver-1", 10.0, "A", "A", "B", None, 10.0, None);
        assert!(result.is_err());
    }

    #[test]
    fn rejects_blank_locations() {
        let result = TripRequest::new("driver-1", 10.0, "  ", "A", "B", None, 55.0, None);
        assert!(result.is_err());
    }
}
