// ABOUTME: Authentication route handlers: registration, login, current user
// ABOUTME: Bcrypt password hashing off the async executor, HS256 session JWTs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! Authentication routes

use crate::{
    constants::limits,
    errors::{AppError, AppResult},
    models::{SubscriptionInfo, User},
    resources::ServerResources,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to register a new account
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
    /// Optional display name
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Response for a successful registration
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// New user id
    pub user_id: String,
    /// Human-readable confirmation
    pub message: String,
}

/// Request to log in
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Email address
    pub email: String,
    /// Password
    pub password: String,
}

/// User info embedded in auth responses
#[derive(Debug, Serialize, Deserialize)]
pub struct UserInfo {
    /// User id
    pub user_id: String,
    /// Email address
    pub email: String,
    /// Display name
    pub display_name: Option<String>,
}

/// Response for a successful login
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Session JWT
    pub jwt_token: String,
    /// Token expiry (RFC 3339)
    pub expires_at: String,
    /// Authenticated user
    pub user: UserInfo,
}

/// Response for the current-user endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    /// Authenticated user
    pub user: UserInfo,
    /// Subscription access info, the gate's input
    pub subscription: SubscriptionInfo,
}

// ============================================================================
// Auth Service
// ============================================================================

/// Registration and login operations, independent of HTTP
pub struct AuthService {
    resources: Arc<ServerResources>,
}

impl AuthService {
    /// Create an auth service over shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Handle user registration
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or the email is taken
    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        tracing::info!("User registration attempt for email: {}", request.email);

        if !Self::is_valid_email(&request.email) {
            return Err(AppError::invalid_input("Invalid email format"));
        }
        if request.password.len() < limits::MIN_PASSWORD_LENGTH {
            return Err(AppError::invalid_input(format!(
                "Password must be at least {} characters",
                limits::MIN_PASSWORD_LENGTH
            )));
        }

        // Hash off the async executor
        let password = request.password.clone();
        let password_hash =
            tokio::task::spawn_blocking(move || bcrypt::hash(&password, bcrypt::DEFAULT_COST))
                .await
                .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Password hashing error: {e}")))?;

        let user = User::new(request.email.clone(), password_hash, request.display_name);
        let user_id = self.resources.database.create_user(&user).await?;

        tracing::info!("User registered successfully: {} ({user_id})", request.email);

        Ok(RegisterResponse {
            user_id: user_id.to_string(),
            message: "User registered successfully".into(),
        })
    }

    /// Handle user login
    ///
    /// # Errors
    ///
    /// Returns an error if credentials are invalid or token generation fails
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        tracing::info!("User login attempt for email: {}", request.email);

        let user = self
            .resources
            .database
            .get_user_by_email(&request.email)
            .await?
            .ok_or_else(|| AppError::auth_invalid("Invalid email or password"))?;

        // Verify password using spawn_blocking to avoid blocking the executor
        let password = request.password.clone();
        let password_hash = user.password_hash.clone();
        let is_valid =
            tokio::task::spawn_blocking(move || bcrypt::verify(&password, &password_hash))
                .await
                .map_err(|e| AppError::internal(format!("Password verification task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Password verification error: {e}")))?;

        if !is_valid {
            tracing::warn!("Invalid password for user: {}", request.email);
            return Err(AppError::auth_invalid("Invalid email or password"));
        }

        self.resources.database.update_last_active(user.id).await?;

        let jwt_token = self.resources.auth_manager.generate_token(&user)?;
        let expires_at = chrono::Utc::now()
            + chrono::Duration::hours(self.resources.config.auth.jwt_expiry_hours);

        tracing::info!("User logged in successfully: {} ({})", request.email, user.id);

        Ok(LoginResponse {
            jwt_token,
            expires_at: expires_at.to_rfc3339(),
            user: UserInfo {
                user_id: user.id.to_string(),
                email: user.email,
                display_name: user.display_name,
            },
        })
    }

    /// Check email shape: one `@`, non-empty local and domain, dotted domain
    #[must_use]
    pub fn is_valid_email(email: &str) -> bool {
        let mut parts = email.split('@');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => {
                !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
            }
            _ => false,
        }
    }
}

// ============================================================================
// Auth Routes
// ============================================================================

/// Auth routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all auth routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/register", post(Self::register))
            .route("/api/auth/login", post(Self::login))
            .route("/api/auth/me", get(Self::me))
            .with_state(resources)
    }

    async fn register(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).register(request).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    async fn login(
        State(resources): State<Arc<ServerResources>>,
        Json(request): Json<LoginRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).login(request).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Current user plus the subscription info the access gate consumes
    async fn me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = super::authenticate(&headers, &resources)?;

        let user = resources
            .database
            .get_user(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;
        let profile = resources.database.get_profile(auth.user_id).await?;

        let response = MeResponse {
            user: UserInfo {
                user_id: user.id.to_string(),
                email: user.email,
                display_name: user.display_name,
            },
            subscription: SubscriptionInfo::current(profile.as_ref()),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_validation() {
        assert!(AuthService::is_valid_email("user@leger.ai"));
        assert!(AuthService::is_valid_email("a.b+c@sub.domain.com"));
        assert!(!AuthService::is_valid_email("no-at-sign"));
        assert!(!AuthService::is_valid_email("@leger.ai"));
        assert!(!AuthService::is_valid_email("user@nodot"));
        assert!(!AuthService::is_valid_email("a@b@c.com"));
    }
}
