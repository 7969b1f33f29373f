use chrono::{DateTime, Utc};

use crate::errors::{AppError, Result};

/// Pure per-minute proportional billing. No minimum charge, no rounding up
/// to whole hours.
pub struct BillingEngine;

impl BillingEngine {
    /// cost = round((minutes / 60) * price_per_hour, 2)
    ///
    /// A leaving timestamp earlier than the parking timestamp is a fatal
    /// consistency violation, never clamped to zero.
    pub fn compute(
        parked_at: DateTime<Utc>,
        left_at: DateTime<Utc>,
        price_per_hour: f64,
    ) -> Result<f64> {
        if left_at < parked_at {
            return Err(AppError::Consistency(format!(
                "negative parking duration: parked at {parked_at}, left at {left_at}"
            )));
        }

        let minutes = (left_at - parked_at).num_milliseconds() as f64 / 60_000.0;
        Ok(round2(minutes / 60.0 * price_per_hour))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, h, m, s).unwrap()
    }

    #[test]
    fn half_hour_at_twenty_per_hour_costs_ten() {
        let cost = BillingEngine::compute(ts(1, 0, 0), ts(1, 30, 0), 20.0).unwrap();
        assert_eq!(cost, 10.00);
    }

    #[test]
    fn forty_five_minutes_at_ten_per_hour_costs_seven_fifty() {
        let cost = BillingEngine::compute(ts(1, 0, 0), ts(1, 45, 0), 10.0).unwrap();
        assert_eq!(cost, 7.50);
    }

    #[test]
    fn zero_duration_costs_zero() {
        let cost = BillingEngine::compute(ts(1, 0, 0), ts(1, 0, 0), 20.0).unwrap();
        assert_eq!(cost, 0.00);
    }

    #[test]
    fn one_minute_rounds_to_two_decimals() {
        // 1 minute at 20/hr = 0.3333... -> 0.33
        let cost = BillingEngine::compute(ts(1, 0, 0), ts(1, 1, 0), 20.0).unwrap();
        assert_eq!(cost, 0.33);
    }

    #[test]
    fn sub_minute_durations_bill_fractionally() {
        // 90 seconds at 40/hr = 1.5 min / 60 * 40 = 1.00
        let left = ts(1, 0, 0) + Duration::seconds(90);
        let cost = BillingEngine::compute(ts(1, 0, 0), left, 40.0).unwrap();
        assert_eq!(cost, 1.00);
    }

    #[test]
    fn negative_duration_is_a_consistency_error() {
        let err = BillingEngine::compute(ts(2, 0, 0), ts(1, 0, 0), 20.0).unwrap_err();
        assert!(matches!(err, AppError::Consistency(_)));
    }
}
