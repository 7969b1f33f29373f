use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One occupancy cycle of one spot: Booked -> Parked -> Released.
/// The state is derived from the two timestamps, never stored separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservationState {
    Booked,
    Parked,
    Released,
}

impl ReservationState {
    pub fn of(
        parking_timestamp: Option<DateTime<Utc>>,
        leaving_timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        match (parking_timestamp, leaving_timestamp) {
            (_, Some(_)) => ReservationState::Released,
            (Some(_), None) => ReservationState::Parked,
            (None, None) => ReservationState::Booked,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reservation {
    pub id: i64,
    pub spot_id: i64,
    pub user_id: i64,
    pub vehicle_number: Option<String>,
    pub booked_at: DateTime<Utc>,
    pub parking_timestamp: Option<DateTime<Utc>>,
    pub leaving_timestamp: Option<DateTime<Utc>>,
    pub parking_cost: Option<f64>,
}

impl Reservation {
    pub fn state(&self) -> ReservationState {
        ReservationState::of(self.parking_timestamp, self.leaving_timestamp)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AllocateRequest {
    pub vehicle_number: Option<String>,
}

/// Reservation listing row joined with its lot. Lot fields are optional
/// because audit reservations can outlive their spot (resize-down, lot
/// deletion).
#[derive(Debug, FromRow, Serialize)]
pub struct ReservationView {
    pub id: i64,
    pub spot_id: i64,
    pub lot_id: Option<i64>,
    pub lot_city: Option<String>,
    pub lot_address: Option<String>,
    pub price_per_hour: Option<f64>,
    pub vehicle_number: Option<String>,
    pub booked_at: DateTime<Utc>,
    pub parking_timestamp: Option<DateTime<Utc>>,
    pub leaving_timestamp: Option<DateTime<Utc>>,
    pub parking_cost: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn state_derivation_follows_timestamps() {
        assert_eq!(ReservationState::of(None, None), ReservationState::Booked);
        assert_eq!(
            ReservationState::of(Some(ts(100)), None),
            ReservationState::Parked
        );
        assert_eq!(
            ReservationState::of(Some(ts(100)), Some(ts(200))),
            ReservationState::Released
        );
        // Cancelled before occupancy: leaving set without parking is still terminal.
        assert_eq!(
            ReservationState::of(None, Some(ts(200))),
            ReservationState::Released
        );
    }
}
