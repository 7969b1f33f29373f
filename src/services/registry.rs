use sqlx::PgPool;

use crate::database::queries::{LotQueries, LOT_COLUMNS};
use crate::errors::{AppError, Result};
use crate::models::{
    LotDetail, LotRequest, LotSummary, ParkingLot, SpotOccupant, SpotStatus, SpotView,
};

/// Owns parking lot entities and their spot pools: creation, resize,
/// deletion. Every mutation keeps `lot.capacity == count(spots)`.
pub struct LotRegistry;

impl LotRegistry {
    pub async fn create_lot(pool: &PgPool, req: &LotRequest) -> Result<ParkingLot> {
        validate_lot_request(req)?;

        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO parking_lots (city, address, pincode, price_per_hour, capacity) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {LOT_COLUMNS}"
        );
        let lot = sqlx::query_as::<_, ParkingLot>(&query)
            .bind(&req.city)
            .bind(&req.address)
            .bind(&req.pincode)
            .bind(req.price_per_hour)
            .bind(req.capacity)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_duplicate_lot)?;

        sqlx::query("INSERT INTO parking_spots (lot_id) SELECT $1 FROM generate_series(1, $2)")
            .bind(lot.id)
            .bind(lot.capacity)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(lot_id = lot.id, capacity = lot.capacity, "parking lot created");
        Ok(lot)
    }

    /// Atomic resize: grow appends available spots, shrink removes exactly
    /// `delta` available spots choosing the highest ids first. All-or-nothing:
    /// if fewer than `delta` spots are available nothing is removed.
    pub async fn resize_lot(pool: &PgPool, lot_id: i64, req: &LotRequest) -> Result<ParkingLot> {
        validate_lot_request(req)?;

        let mut tx = pool.begin().await?;

        let query = format!("SELECT {LOT_COLUMNS} FROM parking_lots WHERE id = $1 FOR UPDATE");
        let lot = sqlx::query_as::<_, ParkingLot>(&query)
            .bind(lot_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("parking lot"))?;

        if req.capacity > lot.capacity {
            sqlx::query(
                "INSERT INTO parking_spots (lot_id) SELECT $1 FROM generate_series(1, $2)",
            )
            .bind(lot_id)
            .bind(req.capacity - lot.capacity)
            .execute(&mut *tx)
            .await?;
        } else if req.capacity < lot.capacity {
            let required = (lot.capacity - req.capacity) as usize;

            // Lock the available spots so a concurrent allocate cannot grab
            // one while we are deciding which to remove.
            let available: Vec<(i64,)> = sqlx::query_as(
                "SELECT id FROM parking_spots \
                 WHERE lot_id = $1 AND status = 'available' \
                 FOR UPDATE",
            )
            .bind(lot_id)
            .fetch_all(&mut *tx)
            .await?;

            let available_ids: Vec<i64> = available.into_iter().map(|(id,)| id).collect();
            let to_remove = removable_spot_ids(available_ids.clone(), required).ok_or_else(|| {
                AppError::Capacity(format!(
                    "cannot remove {required} spots, only {} available",
                    available_ids.len()
                ))
            })?;

            sqlx::query("DELETE FROM parking_spots WHERE id = ANY($1)")
                .bind(&to_remove)
                .execute(&mut *tx)
                .await?;
        }

        let query = format!(
            "UPDATE parking_lots \
             SET city = $2, address = $3, pincode = $4, price_per_hour = $5, capacity = $6 \
             WHERE id = $1 \
             RETURNING {LOT_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, ParkingLot>(&query)
            .bind(lot_id)
            .bind(&req.city)
            .bind(&req.address)
            .bind(&req.pincode)
            .bind(req.price_per_hour)
            .bind(req.capacity)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_duplicate_lot)?;

        tx.commit().await?;

        tracing::info!(lot_id, capacity = updated.capacity, "parking lot resized");
        Ok(updated)
    }

    /// Delete a lot and cascade its spots. Refused while any spot is
    /// reserved or occupied.
    pub async fn delete_lot(pool: &PgPool, lot_id: i64) -> Result<()> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {LOT_COLUMNS} FROM parking_lots WHERE id = $1 FOR UPDATE");
        sqlx::query_as::<_, ParkingLot>(&query)
            .bind(lot_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("parking lot"))?;

        let statuses: Vec<(SpotStatus,)> = sqlx::query_as(
            "SELECT status FROM parking_spots WHERE lot_id = $1 FOR UPDATE",
        )
        .bind(lot_id)
        .fetch_all(&mut *tx)
        .await?;

        if statuses.iter().any(|(s,)| *s != SpotStatus::Available) {
            return Err(AppError::Capacity(
                "cannot delete lot: some spots are reserved or occupied".to_string(),
            ));
        }

        sqlx::query("DELETE FROM parking_spots WHERE lot_id = $1")
            .bind(lot_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM parking_lots WHERE id = $1")
            .bind(lot_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(lot_id, "parking lot deleted");
        Ok(())
    }

    pub async fn list_lots(pool: &PgPool) -> Result<Vec<LotSummary>> {
        LotQueries::list_summaries(pool).await
    }

    pub async fn get_lot(pool: &PgPool, lot_id: i64) -> Result<LotDetail> {
        let summary = LotQueries::summary_by_id(pool, lot_id)
            .await?
            .ok_or(AppError::NotFound("parking lot"))?;

        let spots = LotQueries::occupancy_rows(pool, lot_id)
            .await?
            .into_iter()
            .map(|row| {
                let occupant = match (row.reservation_id, row.user_id, row.booked_at) {
                    (Some(reservation_id), Some(user_id), Some(booked_at)) => Some(SpotOccupant {
                        reservation_id,
                        user_id,
                        name: row.user_name.unwrap_or_default(),
                        email: row.user_email.unwrap_or_default(),
                        booked_at,
                        parking_timestamp: row.parking_timestamp,
                    }),
                    _ => None,
                };
                SpotView {
                    id: row.spot_id,
                    status: row.status,
                    occupant,
                }
            })
            .collect();

        Ok(LotDetail { summary, spots })
    }
}

fn validate_lot_request(req: &LotRequest) -> Result<()> {
    if req.city.trim().is_empty() || req.address.trim().is_empty() || req.pincode.trim().is_empty()
    {
        return Err(AppError::Validation(
            "city, address and pincode are required".to_string(),
        ));
    }
    if req.capacity <= 0 {
        return Err(AppError::Validation(
            "capacity must be greater than zero".to_string(),
        ));
    }
    if req.price_per_hour <= 0.0 {
        return Err(AppError::Validation(
            "price_per_hour must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Pick the spots a resize-down removes: highest ids first, exactly `delta`
/// of them. Returns `None` when fewer than `delta` spots are available, in
/// which case the caller must remove nothing at all.
fn removable_spot_ids(mut available: Vec<i64>, delta: usize) -> Option<Vec<i64>> {
    if available.len() < delta {
        return None;
    }
    available.sort_unstable_by(|a, b| b.cmp(a));
    available.truncate(delta);
    Some(available)
}

/// The UNIQUE (address, pincode) index is the authoritative duplicate guard;
/// translate its violation into the domain conflict error.
fn map_duplicate_lot(e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => AppError::Conflict(
            "parking lot with this address and pincode already exists".to_string(),
        ),
        _ => AppError::from(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removal_picks_highest_ids_first() {
        let ids = vec![3, 9, 1, 7];
        assert_eq!(removable_spot_ids(ids, 2), Some(vec![9, 7]));
    }

    #[test]
    fn removal_of_everything_is_allowed() {
        assert_eq!(removable_spot_ids(vec![2, 1], 2), Some(vec![2, 1]));
    }

    #[test]
    fn removal_fails_whole_when_short() {
        assert_eq!(removable_spot_ids(vec![5], 2), None);
        assert_eq!(removable_spot_ids(vec![], 1), None);
    }

    #[test]
    fn zero_delta_removes_nothing() {
        assert_eq!(removable_spot_ids(vec![4, 2], 0), Some(vec![]));
    }

    #[test]
    fn lot_request_validation() {
        let mut req = LotRequest {
            city: "Pune".to_string(),
            address: "1 MG Road".to_string(),
            pincode: "411001".to_string(),
            price_per_hour: 20.0,
            capacity: 5,
        };
        assert!(validate_lot_request(&req).is_ok());

        req.capacity = 0;
        assert!(matches!(
            validate_lot_request(&req),
            Err(AppError::Validation(_))
        ));

        req.capacity = 5;
        req.price_per_hour = -1.0;
        assert!(matches!(
            validate_lot_request(&req),
            Err(AppError::Validation(_))
        ));

        req.price_per_hour = 20.0;
        req.address = "  ".to_string();
        assert!(matches!(
            validate_lot_request(&req),
            Err(AppError::Validation(_))
        ));
    }
}
