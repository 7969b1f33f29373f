use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::database::queries::{ReservationQueries, UserQueries};
use crate::errors::{AppError, Result};
use crate::handlers::AppState;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::{AllocateRequest, Reservation, ReservationView};
use crate::services::{ReservationLedger, SpotAllocator};

/// Book the lowest-numbered available spot in a lot. The caller never picks
/// a spot; the allocator does.
pub async fn allocate(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(lot_id): Path<i64>,
    body: Option<Json<AllocateRequest>>,
) -> Result<(StatusCode, Json<Reservation>)> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let reservation = SpotAllocator::allocate(
        state.database.pool(),
        lot_id,
        user.id,
        req.vehicle_number.as_deref(),
    )
    .await?;

    Ok((StatusCode::CREATED, Json(reservation)))
}

pub async fn occupy(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(reservation_id): Path<i64>,
) -> Result<Json<Reservation>> {
    authorize_reservation(&state, &user, reservation_id).await?;
    let reservation = ReservationLedger::occupy(state.database.pool(), reservation_id).await?;
    Ok(Json(reservation))
}

pub async fn release(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(reservation_id): Path<i64>,
) -> Result<Json<Reservation>> {
    authorize_reservation(&state, &user, reservation_id).await?;
    let reservation = ReservationLedger::release(state.database.pool(), reservation_id).await?;
    Ok(Json(reservation))
}

pub async fn my_reservations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<ReservationView>>> {
    let reservations =
        ReservationQueries::list_views_by_user(state.database.pool(), user.id).await?;
    Ok(Json(reservations))
}

pub async fn user_reservations(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(user_id): Path<i64>,
) -> Result<Json<Vec<ReservationView>>> {
    UserQueries::find_by_id(state.database.pool(), user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    let reservations =
        ReservationQueries::list_views_by_user(state.database.pool(), user_id).await?;
    Ok(Json(reservations))
}

/// A user may only act on their own reservations; admins may act on any.
async fn authorize_reservation(
    state: &AppState,
    user: &AuthenticatedUser,
    reservation_id: i64,
) -> Result<()> {
    let reservation = ReservationQueries::find_by_id(state.database.pool(), reservation_id)
        .await?
        .ok_or(AppError::NotFound("reservation"))?;

    if !user.is_admin() && reservation.user_id != user.id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}
