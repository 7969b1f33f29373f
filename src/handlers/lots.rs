use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::database::queries::UserQueries;
use crate::errors::Result;
use crate::handlers::AppState;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{LotDetail, LotRequest, LotSummary, ParkingLot};
use crate::services::LotRegistry;

pub async fn create_lot(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(req): Json<LotRequest>,
) -> Result<(StatusCode, Json<ParkingLot>)> {
    let lot = LotRegistry::create_lot(state.database.pool(), &req).await?;

    // Announce the new lot to registered users off the request path; a slow
    // relay must not delay the admin's response.
    let pool = state.database.pool().clone();
    let notifier = state.notifier.clone();
    let city = lot.city.clone();
    tokio::spawn(async move {
        match UserQueries::list_non_admin(&pool).await {
            Ok(users) => {
                for user in users {
                    notifier.notify_lot_created(&user.name, &user.email, &city).await;
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not list users for lot announcement"),
        }
    });

    Ok((StatusCode::CREATED, Json(lot)))
}

pub async fn update_lot(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(lot_id): Path<i64>,
    Json(req): Json<LotRequest>,
) -> Result<Json<ParkingLot>> {
    let lot = LotRegistry::resize_lot(state.database.pool(), lot_id, &req).await?;
    Ok(Json(lot))
}

pub async fn delete_lot(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(lot_id): Path<i64>,
) -> Result<StatusCode> {
    LotRegistry::delete_lot(state.database.pool(), lot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_lots(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> Result<Json<Vec<LotSummary>>> {
    let lots = LotRegistry::list_lots(state.database.pool()).await?;
    Ok(Json(lots))
}

/// Full per-spot occupancy view of one lot, including who holds each spot.
pub async fn get_lot(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(lot_id): Path<i64>,
) -> Result<Json<LotDetail>> {
    let detail = LotRegistry::get_lot(state.database.pool(), lot_id).await?;
    Ok(Json(detail))
}
