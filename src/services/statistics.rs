use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use crate::errors::Result;
use crate::models::{ReservationState, SpotStatus};

/// Read-side aggregation over one consistent snapshot of lot, spot and
/// reservation state. Nothing here is materialized; every figure is derived
/// on request.
pub struct StatisticsAggregator;

/// Minimal reservation projection the aggregations work from.
#[derive(Debug, Clone, FromRow)]
pub struct ReservationStatRow {
    pub user_id: i64,
    pub booked_at: DateTime<Utc>,
    pub parking_timestamp: Option<DateTime<Utc>>,
    pub leaving_timestamp: Option<DateTime<Utc>>,
    pub parking_cost: Option<f64>,
    pub lot_city: Option<String>,
}

impl ReservationStatRow {
    fn state(&self) -> ReservationState {
        ReservationState::of(self.parking_timestamp, self.leaving_timestamp)
    }
}

#[derive(Debug, Serialize)]
pub struct SystemTotals {
    pub users: i64,
    pub lots: i64,
    pub spots: i64,
    pub available_spots: i64,
    pub reserved_spots: i64,
    pub occupied_spots: i64,
    pub reservations: i64,
    pub booked: i64,
    pub parked: i64,
    pub released: i64,
    pub revenue: f64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct DayCount {
    pub date: NaiveDate,
    pub count: i64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct CityCount {
    pub city: String,
    pub count: i64,
}

#[derive(Debug, PartialEq, Serialize)]
pub struct UserSpend {
    pub user_id: i64,
    pub total_spent: f64,
}

#[derive(Debug, Serialize)]
pub struct SystemStatistics {
    pub totals: SystemTotals,
    pub reservations_by_city: Vec<CityCount>,
    pub reservations_over_time: Vec<DayCount>,
    pub spending_by_user: Vec<UserSpend>,
}

#[derive(Debug, Serialize)]
pub struct UserTotals {
    pub reservations: i64,
    pub booked: i64,
    pub parked: i64,
    pub released: i64,
    pub spent: f64,
}

#[derive(Debug, Serialize)]
pub struct UserStatistics {
    pub totals: UserTotals,
    pub reservations_over_time: Vec<DayCount>,
}

const RESERVATION_STAT_QUERY: &str = "SELECT r.user_id, r.booked_at, r.parking_timestamp, \
            r.leaving_timestamp, r.parking_cost, l.city AS lot_city \
     FROM reservations r \
     LEFT JOIN parking_spots s ON s.id = r.spot_id \
     LEFT JOIN parking_lots l ON l.id = s.lot_id";

impl StatisticsAggregator {
    /// System-wide dashboard figures, computed from one REPEATABLE READ
    /// snapshot so the counts and the revenue agree with each other.
    pub async fn system(pool: &PgPool) -> Result<SystemStatistics> {
        let mut tx = pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let (users,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'user'")
                .fetch_one(&mut *tx)
                .await?;
        let (lots,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM parking_lots")
            .fetch_one(&mut *tx)
            .await?;
        let spot_statuses: Vec<(SpotStatus,)> =
            sqlx::query_as("SELECT status FROM parking_spots")
                .fetch_all(&mut *tx)
                .await?;
        let reservations: Vec<ReservationStatRow> =
            sqlx::query_as(RESERVATION_STAT_QUERY).fetch_all(&mut *tx).await?;

        tx.commit().await?;

        let statuses: Vec<SpotStatus> = spot_statuses.into_iter().map(|(s,)| s).collect();
        Ok(aggregate_system(users, lots, &statuses, &reservations))
    }

    /// One user's reservation statistics from a consistent snapshot.
    pub async fn for_user(pool: &PgPool, user_id: i64) -> Result<UserStatistics> {
        let query = format!("{RESERVATION_STAT_QUERY} WHERE r.user_id = $1");
        let reservations: Vec<ReservationStatRow> = sqlx::query_as(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(aggregate_user(&reservations))
    }
}

pub fn aggregate_system(
    users: i64,
    lots: i64,
    spot_statuses: &[SpotStatus],
    reservations: &[ReservationStatRow],
) -> SystemStatistics {
    let count_spots = |wanted: SpotStatus| -> i64 {
        spot_statuses.iter().filter(|s| **s == wanted).count() as i64
    };
    let count_state = |wanted: ReservationState| -> i64 {
        reservations.iter().filter(|r| r.state() == wanted).count() as i64
    };

    let revenue = released_cost_sum(reservations);

    let mut by_city: BTreeMap<String, i64> = BTreeMap::new();
    for r in reservations {
        if let Some(city) = &r.lot_city {
            *by_city.entry(city.clone()).or_insert(0) += 1;
        }
    }

    let mut by_user: BTreeMap<i64, f64> = BTreeMap::new();
    for r in reservations {
        if r.leaving_timestamp.is_some() {
            *by_user.entry(r.user_id).or_insert(0.0) += r.parking_cost.unwrap_or(0.0);
        }
    }

    SystemStatistics {
        totals: SystemTotals {
            users,
            lots,
            spots: spot_statuses.len() as i64,
            available_spots: count_spots(SpotStatus::Available),
            reserved_spots: count_spots(SpotStatus::Reserved),
            occupied_spots: count_spots(SpotStatus::Occupied),
            reservations: reservations.len() as i64,
            booked: count_state(ReservationState::Booked),
            parked: count_state(ReservationState::Parked),
            released: count_state(ReservationState::Released),
            revenue,
        },
        reservations_by_city: by_city
            .into_iter()
            .map(|(city, count)| CityCount { city, count })
            .collect(),
        reservations_over_time: reservations_per_day(reservations),
        spending_by_user: by_user
            .into_iter()
            .map(|(user_id, total_spent)| UserSpend {
                user_id,
                total_spent: round2(total_spent),
            })
            .collect(),
    }
}

pub fn aggregate_user(reservations: &[ReservationStatRow]) -> UserStatistics {
    let count_state = |wanted: ReservationState| -> i64 {
        reservations.iter().filter(|r| r.state() == wanted).count() as i64
    };

    UserStatistics {
        totals: UserTotals {
            reservations: reservations.len() as i64,
            booked: count_state(ReservationState::Booked),
            parked: count_state(ReservationState::Parked),
            released: count_state(ReservationState::Released),
            spent: released_cost_sum(reservations),
        },
        reservations_over_time: reservations_per_day(reservations),
    }
}

/// Sum of cost over released reservations, rounded to cents.
fn released_cost_sum(reservations: &[ReservationStatRow]) -> f64 {
    let sum: f64 = reservations
        .iter()
        .filter(|r| r.leaving_timestamp.is_some())
        .map(|r| r.parking_cost.unwrap_or(0.0))
        .sum();
    round2(sum)
}

/// Group by calendar day of booked_at, ascending.
fn reservations_per_day(reservations: &[ReservationStatRow]) -> Vec<DayCount> {
    let mut per_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for r in reservations {
        *per_day.entry(r.booked_at.date_naive()).or_insert(0) += 1;
    }
    per_day
        .into_iter()
        .map(|(date, count)| DayCount { date, count })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, day, hour, 0, 0).unwrap()
    }

    fn row(
        user_id: i64,
        day: u32,
        parked: bool,
        released: Option<f64>,
        city: &str,
    ) -> ReservationStatRow {
        ReservationStatRow {
            user_id,
            booked_at: ts(day, 9),
            parking_timestamp: parked.then(|| ts(day, 10)),
            leaving_timestamp: released.map(|_| ts(day, 11)),
            parking_cost: released,
            lot_city: Some(city.to_string()),
        }
    }

    #[test]
    fn system_aggregation_over_snapshot() {
        let statuses = vec![
            SpotStatus::Available,
            SpotStatus::Available,
            SpotStatus::Reserved,
            SpotStatus::Occupied,
        ];
        let reservations = vec![
            row(1, 1, false, None, "Pune"),          // booked
            row(1, 1, true, None, "Pune"),           // parked
            row(2, 2, true, Some(7.5), "Mumbai"),    // released
            row(2, 3, true, Some(10.0), "Mumbai"),   // released
        ];

        let stats = aggregate_system(5, 2, &statuses, &reservations);

        assert_eq!(stats.totals.users, 5);
        assert_eq!(stats.totals.lots, 2);
        assert_eq!(stats.totals.spots, 4);
        assert_eq!(stats.totals.available_spots, 2);
        assert_eq!(stats.totals.reserved_spots, 1);
        assert_eq!(stats.totals.occupied_spots, 1);
        assert_eq!(stats.totals.reservations, 4);
        assert_eq!(stats.totals.booked, 1);
        assert_eq!(stats.totals.parked, 1);
        assert_eq!(stats.totals.released, 2);
        assert_eq!(stats.totals.revenue, 17.50);

        assert_eq!(
            stats.reservations_by_city,
            vec![
                CityCount { city: "Mumbai".to_string(), count: 2 },
                CityCount { city: "Pune".to_string(), count: 2 },
            ]
        );
        assert_eq!(
            stats.reservations_over_time,
            vec![
                DayCount { date: ts(1, 0).date_naive(), count: 2 },
                DayCount { date: ts(2, 0).date_naive(), count: 1 },
                DayCount { date: ts(3, 0).date_naive(), count: 1 },
            ]
        );
        assert_eq!(
            stats.spending_by_user,
            vec![UserSpend { user_id: 2, total_spent: 17.50 }]
        );
    }

    #[test]
    fn user_aggregation_counts_lifecycle_states() {
        let reservations = vec![
            row(7, 1, false, None, "Pune"),
            row(7, 1, true, Some(3.33), "Pune"),
            row(7, 2, true, Some(0.0), "Pune"),
        ];

        let stats = aggregate_user(&reservations);

        assert_eq!(stats.totals.reservations, 3);
        assert_eq!(stats.totals.booked, 1);
        assert_eq!(stats.totals.parked, 0);
        assert_eq!(stats.totals.released, 2);
        assert_eq!(stats.totals.spent, 3.33);
        assert_eq!(stats.reservations_over_time.len(), 2);
    }

    #[test]
    fn cancelled_reservation_counts_as_released_with_zero_cost() {
        let reservations = vec![ReservationStatRow {
            user_id: 1,
            booked_at: ts(4, 9),
            parking_timestamp: None,
            leaving_timestamp: Some(ts(4, 10)),
            parking_cost: Some(0.0),
            lot_city: Some("Pune".to_string()),
        }];

        let stats = aggregate_user(&reservations);
        assert_eq!(stats.totals.released, 1);
        assert_eq!(stats.totals.spent, 0.0);
    }

    #[test]
    fn empty_snapshot_aggregates_to_zeroes() {
        let stats = aggregate_system(0, 0, &[], &[]);
        assert_eq!(stats.totals.revenue, 0.0);
        assert!(stats.reservations_by_city.is_empty());
        assert!(stats.reservations_over_time.is_empty());
        assert!(stats.spending_by_user.is_empty());
    }
}
