use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    auth::JwtService,
    database::queries::UserQueries,
    handlers::AppState,
    models::Role,
};

/// Identity extracted from a verified access token. The user row is
/// re-checked so a deleted account cannot keep using stale tokens.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub pincode: String,
}

impl AuthenticatedUser {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Authorization interceptor for admin-only operations (lot CRUD, global
/// statistics, arbitrary-user reservation listing). Composed into routes
/// as an extractor so the role check happens before dispatch.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthenticatedUser);

fn unauthorized(message: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": message, "status": 401})),
    )
        .into_response()
}

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|header| header.to_str().ok());

        let Some(token) = auth_header.and_then(|h| h.strip_prefix("Bearer ")) else {
            return Err(unauthorized("Authentication required"));
        };

        let jwt_service = JwtService::new(&state.config.jwt_secret);
        let claims = jwt_service
            .verify_access_token(token)
            .map_err(|_| unauthorized("Invalid or expired token"))?;

        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| unauthorized("Invalid token"))?;

        match UserQueries::find_by_id(state.database.pool(), user_id).await {
            Ok(Some(user)) => Ok(AuthenticatedUser {
                id: user.id,
                name: user.name,
                email: user.email,
                role: user.role,
                pincode: user.pincode,
            }),
            Ok(None) => Err(unauthorized("User not found")),
            Err(e) => {
                tracing::error!("Database error during authentication: {}", e);
                Err((
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Database error", "status": 500})),
                )
                    .into_response())
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err((
                StatusCode::FORBIDDEN,
                Json(json!({"error": "Admins only", "status": 403})),
            )
                .into_response());
        }

        Ok(AdminUser(user))
    }
}
