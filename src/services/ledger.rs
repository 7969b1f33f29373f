use chrono::Utc;
use sqlx::PgPool;

use crate::database::queries::RESERVATION_COLUMNS;
use crate::errors::{AppError, Result};
use crate::models::{ParkingSpot, Reservation, SpotStatus};
use crate::services::billing::BillingEngine;

/// Drives the Booked -> Parked -> Released reservation state machine.
/// Both transitions lock the reservation row and its spot row, so a
/// reservation can never be double-occupied or double-released.
pub struct ReservationLedger;

impl ReservationLedger {
    /// Booked -> Parked: the vehicle has arrived at its reserved spot.
    pub async fn occupy(pool: &PgPool, reservation_id: i64) -> Result<Reservation> {
        let mut tx = pool.begin().await?;

        let reservation = lock_reservation(&mut tx, reservation_id).await?;

        if reservation.parking_timestamp.is_some() {
            return Err(AppError::State("spot already occupied".to_string()));
        }
        if reservation.leaving_timestamp.is_some() {
            return Err(AppError::State("reservation already released".to_string()));
        }

        let spot = lock_spot(&mut tx, reservation.spot_id).await?;
        if spot.status != SpotStatus::Reserved {
            return Err(AppError::State(
                "spot is not in reserved state".to_string(),
            ));
        }

        sqlx::query("UPDATE parking_spots SET status = 'occupied' WHERE id = $1")
            .bind(spot.id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "UPDATE reservations SET parking_timestamp = $2 WHERE id = $1 \
             RETURNING {RESERVATION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Reservation>(&query)
            .bind(reservation_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(reservation_id, spot_id = spot.id, "spot occupied");
        Ok(updated)
    }

    /// Parked -> Released, or Booked -> Released (cancellation before
    /// occupancy, billed at zero). Terminal: the reservation becomes an
    /// immutable billing record and the spot returns to Available.
    pub async fn release(pool: &PgPool, reservation_id: i64) -> Result<Reservation> {
        let mut tx = pool.begin().await?;

        let reservation = lock_reservation(&mut tx, reservation_id).await?;

        if reservation.leaving_timestamp.is_some() {
            return Err(AppError::State("spot already released".to_string()));
        }

        let spot = lock_spot(&mut tx, reservation.spot_id).await?;
        if spot.status != SpotStatus::Occupied && spot.status != SpotStatus::Reserved {
            return Err(AppError::State(
                "spot is not occupied or reserved".to_string(),
            ));
        }

        let left_at = Utc::now();
        let cost = match reservation.parking_timestamp {
            Some(parked_at) => {
                let (price_per_hour,): (f64,) =
                    sqlx::query_as("SELECT price_per_hour FROM parking_lots WHERE id = $1")
                        .bind(spot.lot_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .ok_or(AppError::NotFound("parking lot"))?;

                BillingEngine::compute(parked_at, left_at, price_per_hour)?
            }
            None => 0.0,
        };

        let query = format!(
            "UPDATE reservations \
             SET leaving_timestamp = $2, parking_cost = $3 \
             WHERE id = $1 \
             RETURNING {RESERVATION_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Reservation>(&query)
            .bind(reservation_id)
            .bind(left_at)
            .bind(cost)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE parking_spots SET status = 'available' WHERE id = $1")
            .bind(spot.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(reservation_id, spot_id = spot.id, cost, "spot released");
        Ok(updated)
    }
}

async fn lock_reservation(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    reservation_id: i64,
) -> Result<Reservation> {
    let query = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1 FOR UPDATE");
    sqlx::query_as::<_, Reservation>(&query)
        .bind(reservation_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(AppError::NotFound("reservation"))
}

async fn lock_spot(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    spot_id: i64,
) -> Result<ParkingSpot> {
    sqlx::query_as::<_, ParkingSpot>(
        "SELECT id, lot_id, status FROM parking_spots WHERE id = $1 FOR UPDATE",
    )
    .bind(spot_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(AppError::NotFound("parking spot"))
}
