use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "spot_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SpotStatus {
    Available,
    Reserved,
    Occupied,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParkingLot {
    pub id: i64,
    pub city: String,
    pub address: String,
    pub pincode: String,
    pub price_per_hour: f64,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ParkingSpot {
    pub id: i64,
    pub lot_id: i64,
    pub status: SpotStatus,
}

/// Create and edit requests share the same field set.
#[derive(Debug, Deserialize)]
pub struct LotRequest {
    pub city: String,
    pub address: String,
    pub pincode: String,
    pub price_per_hour: f64,
    pub capacity: i32,
}

/// Lot list view: spot counts are computed on read, never stored.
#[derive(Debug, FromRow, Serialize)]
pub struct LotSummary {
    pub id: i64,
    pub city: String,
    pub address: String,
    pub pincode: String,
    pub price_per_hour: f64,
    pub capacity: i32,
    pub created_at: DateTime<Utc>,
    pub available_spots: i64,
    pub reserved_spots: i64,
    pub occupied_spots: i64,
}

/// Per-spot row of the admin lot detail view, joined against the spot's
/// active reservation (if any) and its holder.
#[derive(Debug, FromRow)]
pub struct SpotOccupancyRow {
    pub spot_id: i64,
    pub status: SpotStatus,
    pub reservation_id: Option<i64>,
    pub user_id: Option<i64>,
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub booked_at: Option<DateTime<Utc>>,
    pub parking_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SpotOccupant {
    pub reservation_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub booked_at: DateTime<Utc>,
    pub parking_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SpotView {
    pub id: i64,
    pub status: SpotStatus,
    pub occupant: Option<SpotOccupant>,
}

#[derive(Debug, Serialize)]
pub struct LotDetail {
    #[serde(flatten)]
    pub summary: LotSummary,
    pub spots: Vec<SpotView>,
}
