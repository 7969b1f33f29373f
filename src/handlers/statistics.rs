use axum::extract::State;
use axum::Json;

use crate::errors::Result;
use crate::handlers::AppState;
use crate::middleware::{AdminUser, AuthenticatedUser};
use crate::services::statistics::{SystemStatistics, UserStatistics};
use crate::services::StatisticsAggregator;

pub async fn system(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<SystemStatistics>> {
    let stats = StatisticsAggregator::system(state.database.pool()).await?;
    Ok(Json(stats))
}

pub async fn mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<UserStatistics>> {
    let stats = StatisticsAggregator::for_user(state.database.pool(), user.id).await?;
    Ok(Json(stats))
}
