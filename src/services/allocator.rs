use sqlx::PgPool;

use crate::database::queries::RESERVATION_COLUMNS;
use crate::errors::{AppError, Result};
use crate::models::Reservation;

/// Selects and reserves an Available spot within a lot. Allocation is
/// deterministic (lowest spot id first) and race-free: the chosen spot row
/// is locked before the status flip, so two concurrent calls can never
/// reserve the same spot.
pub struct SpotAllocator;

impl SpotAllocator {
    pub async fn allocate(
        pool: &PgPool,
        lot_id: i64,
        user_id: i64,
        vehicle_number: Option<&str>,
    ) -> Result<Reservation> {
        let mut tx = pool.begin().await?;

        let lot: Option<(i64,)> = sqlx::query_as("SELECT id FROM parking_lots WHERE id = $1")
            .bind(lot_id)
            .fetch_optional(&mut *tx)
            .await?;
        if lot.is_none() {
            return Err(AppError::NotFound("parking lot"));
        }

        // SKIP LOCKED keeps concurrent allocators from queueing on the same
        // row: each takes the lowest-id spot not already claimed in-flight.
        let spot: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM parking_spots \
             WHERE lot_id = $1 AND status = 'available' \
             ORDER BY id ASC \
             LIMIT 1 \
             FOR UPDATE SKIP LOCKED",
        )
        .bind(lot_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (spot_id,) = spot.ok_or_else(|| {
            AppError::Capacity("no available spots in this lot".to_string())
        })?;

        sqlx::query("UPDATE parking_spots SET status = 'reserved' WHERE id = $1")
            .bind(spot_id)
            .execute(&mut *tx)
            .await?;

        let query = format!(
            "INSERT INTO reservations (spot_id, user_id, vehicle_number) \
             VALUES ($1, $2, $3) \
             RETURNING {RESERVATION_COLUMNS}"
        );
        let reservation = sqlx::query_as::<_, Reservation>(&query)
            .bind(spot_id)
            .bind(user_id)
            .bind(vehicle_number)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(
            reservation_id = reservation.id,
            spot_id,
            lot_id,
            user_id,
            "spot reserved"
        );
        Ok(reservation)
    }
}
