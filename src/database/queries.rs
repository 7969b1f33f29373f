use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{
    ExportJob, LotSummary, ParkingLot, Reservation, ReservationView, Role, SpotOccupancyRow, User,
};

/// Column list for `users` queries.
const USER_COLUMNS: &str = "id, name, email, password_hash, role, pincode, created_at";

/// Column list for `parking_lots` queries.
pub(crate) const LOT_COLUMNS: &str =
    "id, city, address, pincode, price_per_hour, capacity, created_at";

/// Column list for `reservations` queries.
pub(crate) const RESERVATION_COLUMNS: &str = "id, spot_id, user_id, vehicle_number, \
    booked_at, parking_timestamp, leaving_timestamp, parking_cost";

/// Column list for `export_jobs` queries.
const JOB_COLUMNS: &str = "id, user_id, status, result_path, error, submitted_at, completed_at";

pub struct UserQueries;

impl UserQueries {
    pub async fn create_user(
        pool: &PgPool,
        name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
        pincode: &str,
    ) -> Result<User> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, role, pincode) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&query)
            .bind(name)
            .bind(email)
            .bind(password_hash)
            .bind(role)
            .bind(pincode)
            .fetch_one(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn find_any_admin(pool: &PgPool) -> Result<Option<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE role = 'admin' LIMIT 1");
        let user = sqlx::query_as::<_, User>(&query)
            .fetch_optional(pool)
            .await?;

        Ok(user)
    }

    pub async fn list_non_admin(pool: &PgPool) -> Result<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE role <> 'admin' ORDER BY id");
        let users = sqlx::query_as::<_, User>(&query).fetch_all(pool).await?;

        Ok(users)
    }
}

pub struct LotQueries;

impl LotQueries {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<ParkingLot>> {
        let query = format!("SELECT {LOT_COLUMNS} FROM parking_lots WHERE id = $1");
        let lot = sqlx::query_as::<_, ParkingLot>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(lot)
    }

    /// Lot list view with spot counts computed on read.
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<LotSummary>> {
        let summaries = sqlx::query_as::<_, LotSummary>(
            "SELECT l.id, l.city, l.address, l.pincode, l.price_per_hour, l.capacity, \
                    l.created_at, \
                    COUNT(s.id) FILTER (WHERE s.status = 'available') AS available_spots, \
                    COUNT(s.id) FILTER (WHERE s.status = 'reserved') AS reserved_spots, \
                    COUNT(s.id) FILTER (WHERE s.status = 'occupied') AS occupied_spots \
             FROM parking_lots l \
             LEFT JOIN parking_spots s ON s.lot_id = l.id \
             GROUP BY l.id \
             ORDER BY l.id",
        )
        .fetch_all(pool)
        .await?;

        Ok(summaries)
    }

    pub async fn summary_by_id(pool: &PgPool, id: i64) -> Result<Option<LotSummary>> {
        let summary = sqlx::query_as::<_, LotSummary>(
            "SELECT l.id, l.city, l.address, l.pincode, l.price_per_hour, l.capacity, \
                    l.created_at, \
                    COUNT(s.id) FILTER (WHERE s.status = 'available') AS available_spots, \
                    COUNT(s.id) FILTER (WHERE s.status = 'reserved') AS reserved_spots, \
                    COUNT(s.id) FILTER (WHERE s.status = 'occupied') AS occupied_spots \
             FROM parking_lots l \
             LEFT JOIN parking_spots s ON s.lot_id = l.id \
             WHERE l.id = $1 \
             GROUP BY l.id",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(summary)
    }

    /// Per-spot detail rows for the admin lot view, joined against each
    /// spot's active reservation and its holder.
    pub async fn occupancy_rows(pool: &PgPool, lot_id: i64) -> Result<Vec<SpotOccupancyRow>> {
        let rows = sqlx::query_as::<_, SpotOccupancyRow>(
            "SELECT s.id AS spot_id, s.status, \
                    r.id AS reservation_id, r.user_id, \
                    u.name AS user_name, u.email AS user_email, \
                    r.booked_at, r.parking_timestamp \
             FROM parking_spots s \
             LEFT JOIN reservations r ON r.spot_id = s.id AND r.leaving_timestamp IS NULL \
             LEFT JOIN users u ON u.id = r.user_id \
             WHERE s.lot_id = $1 \
             ORDER BY s.id",
        )
        .bind(lot_id)
        .fetch_all(pool)
        .await?;

        Ok(rows)
    }
}

pub struct ReservationQueries;

impl ReservationQueries {
    pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Reservation>> {
        let query = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1");
        let reservation = sqlx::query_as::<_, Reservation>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(reservation)
    }

    pub async fn list_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<Reservation>> {
        let query = format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE user_id = $1 ORDER BY id"
        );
        let reservations = sqlx::query_as::<_, Reservation>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await?;

        Ok(reservations)
    }

    /// Reservation listing joined with lot details, newest first. Uses LEFT
    /// JOINs so audit records whose spot was since removed still appear.
    pub async fn list_views_by_user(pool: &PgPool, user_id: i64) -> Result<Vec<ReservationView>> {
        let views = sqlx::query_as::<_, ReservationView>(
            "SELECT r.id, r.spot_id, \
                    l.id AS lot_id, l.city AS lot_city, l.address AS lot_address, \
                    l.price_per_hour, \
                    r.vehicle_number, r.booked_at, r.parking_timestamp, \
                    r.leaving_timestamp, r.parking_cost \
             FROM reservations r \
             LEFT JOIN parking_spots s ON s.id = r.spot_id \
             LEFT JOIN parking_lots l ON l.id = s.lot_id \
             WHERE r.user_id = $1 \
             ORDER BY r.booked_at DESC",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(views)
    }
}

pub struct JobQueries;

impl JobQueries {
    pub async fn insert(pool: &PgPool, id: Uuid, user_id: i64) -> Result<ExportJob> {
        let query = format!(
            "INSERT INTO export_jobs (id, user_id) VALUES ($1, $2) RETURNING {JOB_COLUMNS}"
        );
        let job = sqlx::query_as::<_, ExportJob>(&query)
            .bind(id)
            .bind(user_id)
            .fetch_one(pool)
            .await?;

        Ok(job)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<ExportJob>> {
        let query = format!("SELECT {JOB_COLUMNS} FROM export_jobs WHERE id = $1");
        let job = sqlx::query_as::<_, ExportJob>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(job)
    }

    pub async fn mark_success(pool: &PgPool, id: Uuid, result_path: &str) -> Result<()> {
        sqlx::query(
            "UPDATE export_jobs \
             SET status = 'success', result_path = $2, completed_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(result_path)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn mark_failed(pool: &PgPool, id: Uuid, error: &str) -> Result<()> {
        sqlx::query(
            "UPDATE export_jobs \
             SET status = 'failed', error = $2, completed_at = NOW() \
             WHERE id = $1",
        )
        .bind(id)
        .bind(error)
        .execute(pool)
        .await?;

        Ok(())
    }
}
