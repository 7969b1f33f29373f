use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::errors::{AppError, Result};
use crate::models::{Role, User};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub role: Role,
    pub pincode: String,
    pub exp: i64,
    pub iat: i64,
    pub token_type: TokenType,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    Access,
    Refresh,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_duration: Duration,
    refresh_token_duration: Duration,
}

impl JwtService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            access_token_duration: Duration::hours(1),
            refresh_token_duration: Duration::days(7),
        }
    }

    pub fn generate_access_token(&self, user: &User) -> Result<String> {
        self.generate_token(user, TokenType::Access, self.access_token_duration)
    }

    pub fn generate_refresh_token(&self, user: &User) -> Result<String> {
        self.generate_token(user, TokenType::Refresh, self.refresh_token_duration)
    }

    fn generate_token(
        &self,
        user: &User,
        token_type: TokenType,
        duration: Duration,
    ) -> Result<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            pincode: user.pincode.clone(),
            exp: (now + duration).timestamp(),
            iat: now.timestamp(),
            token_type,
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Auth(format!("Failed to generate token: {e}")))
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| AppError::Auth(format!("Invalid token: {e}")))?;

        Ok(token_data.claims)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims> {
        let claims = self.verify_token(token)?;

        match claims.token_type {
            TokenType::Access => Ok(claims),
            TokenType::Refresh => Err(AppError::Auth(
                "Expected access token, got refresh token".to_string(),
            )),
        }
    }

    pub fn verify_refresh_token(&self, token: &str) -> Result<Claims> {
        let claims = self.verify_token(token)?;

        match claims.token_type {
            TokenType::Refresh => Ok(claims),
            TokenType::Access => Err(AppError::Auth(
                "Expected refresh token, got access token".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user(role: Role) -> User {
        User {
            id: 42,
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "hash".to_string(),
            role,
            pincode: "560001".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_jwt_generation_and_verification() {
        let jwt_service = JwtService::new("test-secret");
        let user = test_user(Role::User);

        let access_token = jwt_service.generate_access_token(&user).unwrap();
        let refresh_token = jwt_service.generate_refresh_token(&user).unwrap();

        let access_claims = jwt_service.verify_access_token(&access_token).unwrap();
        let refresh_claims = jwt_service.verify_refresh_token(&refresh_token).unwrap();

        assert_eq!(access_claims.sub, "42");
        assert_eq!(access_claims.email, user.email);
        assert_eq!(access_claims.role, Role::User);
        assert_eq!(access_claims.pincode, "560001");
        assert_eq!(refresh_claims.sub, "42");
    }

    #[test]
    fn test_token_type_mismatch_rejected() {
        let jwt_service = JwtService::new("test-secret");
        let user = test_user(Role::Admin);

        let access_token = jwt_service.generate_access_token(&user).unwrap();
        let refresh_token = jwt_service.generate_refresh_token(&user).unwrap();

        assert!(jwt_service.verify_refresh_token(&access_token).is_err());
        assert!(jwt_service.verify_access_token(&refresh_token).is_err());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let user = test_user(Role::User);
        let token = JwtService::new("secret-a")
            .generate_access_token(&user)
            .unwrap();

        assert!(JwtService::new("secret-b").verify_access_token(&token).is_err());
    }
}
