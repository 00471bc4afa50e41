// ABOUTME: JWT-based user authentication and session token management
// ABOUTME: Handles token generation, validation, and user id extraction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! # Authentication and Session Management
//!
//! HS256 JWT issuance and validation for web sessions. Password hashing
//! lives in the auth routes; this module only deals in tokens.

use crate::constants::service_names;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `JWT` claims for user authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User `ID`
    pub sub: String,
    /// User email
    pub email: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
    /// Audience (who the token is intended for)
    pub aud: String,
}

/// Authentication result with user context
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// Authenticated user `ID`
    pub user_id: Uuid,
    /// Authenticated user email
    pub email: String,
}

/// Session token manager
pub struct AuthManager {
    secret: Vec<u8>,
    token_expiry_hours: i64,
}

impl AuthManager {
    /// Create a new authentication manager
    #[must_use]
    pub const fn new(secret: Vec<u8>, token_expiry_hours: i64) -> Self {
        Self {
            secret,
            token_expiry_hours,
        }
    }

    /// Generate a session `JWT` for a user
    ///
    /// # Errors
    ///
    /// Returns an error if JWT encoding fails
    pub fn generate_token(&self, user: &User) -> AppResult<String> {
        let now = Utc::now();
        let expiry = now + Duration::hours(self.token_expiry_hours);

        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            iat: now.timestamp(),
            exp: expiry.timestamp(),
            aud: service_names::WEB_AUDIENCE.to_owned(),
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|e| AppError::internal(format!("Failed to encode session token: {e}")))
    }

    /// Validate a session token and return its claims
    ///
    /// # Errors
    ///
    /// Returns an error if the signature is invalid, the token has expired,
    /// or the token is malformed
    pub fn validate_token(&self, token: &str) -> AppResult<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_audience(&[service_names::WEB_AUDIENCE]);

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::auth_expired(),
                _ => AppError::auth_invalid(format!("Invalid session token: {e}")),
            })?;

        Ok(data.claims)
    }

    /// Validate a `Bearer` authorization header value and resolve the user
    ///
    /// # Errors
    ///
    /// Returns an error if the header is not a bearer token or the token
    /// fails validation
    pub fn authenticate_header(&self, auth_header: &str) -> AppResult<AuthResult> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::auth_invalid("Authorization header must be a bearer token"))?;

        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::auth_invalid("Session token subject is not a user id"))?;

        Ok(AuthResult {
            user_id,
            email: claims.email,
        })
    }
}

/// Generate a random secret suitable for signing session tokens
#[must_use]
pub fn generate_jwt_secret() -> [u8; 64] {
    let mut secret = [0u8; 64];
    rand::rngs::OsRng.fill_bytes(&mut secret);
    secret
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn test_user() -> User {
        User::new("user@leger.ai".into(), "hash".into(), None)
    }

    fn manager() -> AuthManager {
        AuthManager::new(generate_jwt_secret().to_vec(), 24)
    }

    #[test]
    fn test_token_round_trip() {
        let manager = manager();
        let user = test_user();

        let token = manager.generate_token(&user).unwrap();
        let claims = manager.validate_token(&token).unwrap();

        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.aud, service_names::WEB_AUDIENCE);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let user = test_user();
        let token = manager().generate_token(&user).unwrap();

        let other = manager();
        assert!(other.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let manager = AuthManager::new(generate_jwt_secret().to_vec(), -1);
        let token = manager.generate_token(&test_user()).unwrap();

        let err = manager.validate_token(&token).unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::AuthExpired);
    }

    #[test]
    fn test_authenticate_header_requires_bearer_scheme() {
        let manager = manager();
        let user = test_user();
        let token = manager.generate_token(&user).unwrap();

        let auth = manager
            .authenticate_header(&format!("Bearer {token}"))
            .unwrap();
        assert_eq!(auth.user_id, user.id);

        assert!(manager.authenticate_header(&token).is_err());
    }
}
