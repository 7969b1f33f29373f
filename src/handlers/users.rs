use axum::extract::State;
use axum::Json;

use crate::database::queries::UserQueries;
use crate::errors::{AppError, Result};
use crate::handlers::AppState;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::models::UserResponse;

/// Admin listing of registered (non-admin) users.
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<UserResponse>>> {
    let users = UserQueries::list_non_admin(state.database.pool()).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserResponse>> {
    let user = UserQueries::find_by_id(state.database.pool(), user.id)
        .await?
        .ok_or(AppError::NotFound("user"))?;
    Ok(Json(UserResponse::from(user)))
}
