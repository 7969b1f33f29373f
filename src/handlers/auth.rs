use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::auth::{JwtService, PasswordService};
use crate::database::queries::UserQueries;
use crate::errors::{AppError, Result};
use crate::handlers::AppState;
use crate::models::{AuthResponse, CreateUserRequest, LoginRequest, Role, UserResponse};

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    if req.name.trim().is_empty() || req.pincode.trim().is_empty() {
        return Err(AppError::Validation(
            "name and pincode are required".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::Validation("invalid email address".to_string()));
    }
    PasswordService::validate_password_strength(&req.password)?;

    if UserQueries::find_by_email(state.database.pool(), &req.email)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "user with this email already exists".to_string(),
        ));
    }

    let password_hash = PasswordService::hash_password(&req.password)?;
    let user = UserQueries::create_user(
        state.database.pool(),
        &req.name,
        &req.email,
        &password_hash,
        Role::User,
        &req.pincode,
    )
    .await?;

    tracing::info!(user_id = user.id, "user registered");

    let jwt = JwtService::new(&state.config.jwt_secret);
    let response = AuthResponse {
        access_token: jwt.generate_access_token(&user)?,
        refresh_token: jwt.generate_refresh_token(&user)?,
        user: UserResponse::from(user),
    };
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let user = UserQueries::find_by_email(state.database.pool(), &req.email)
        .await?
        .ok_or_else(|| AppError::Auth("invalid email or password".to_string()))?;

    if !PasswordService::verify_password(&req.password, &user.password_hash)? {
        return Err(AppError::Auth("invalid email or password".to_string()));
    }

    tracing::info!(user_id = user.id, "user logged in");

    let jwt = JwtService::new(&state.config.jwt_secret);
    Ok(Json(AuthResponse {
        access_token: jwt.generate_access_token(&user)?,
        refresh_token: jwt.generate_refresh_token(&user)?,
        user: UserResponse::from(user),
    }))
}

pub async fn refresh(
    State(state): State<AppState>,
    Json(req): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>> {
    let jwt = JwtService::new(&state.config.jwt_secret);
    let claims = jwt.verify_refresh_token(&req.refresh_token)?;

    let user_id: i64 = claims
        .sub
        .parse()
        .map_err(|_| AppError::Auth("invalid token subject".to_string()))?;

    let user = UserQueries::find_by_id(state.database.pool(), user_id)
        .await?
        .ok_or_else(|| AppError::Auth("user no longer exists".to_string()))?;

    Ok(Json(AuthResponse {
        access_token: jwt.generate_access_token(&user)?,
        refresh_token: jwt.generate_refresh_token(&user)?,
        user: UserResponse::from(user),
    }))
}
