// ABOUTME: Profile route handlers for user-driven edits
// ABOUTME: Display name and avatar only; subscription fields belong to the webhook
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! Profile routes

use crate::{
    errors::AppError,
    models::SubscriptionInfo,
    resources::ServerResources,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::put,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Body of `PUT /api/profile`
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    /// New display name
    #[serde(default)]
    pub full_name: Option<String>,
    /// New avatar reference
    #[serde(default)]
    pub avatar_url: Option<String>,
}

/// Response with the updated subscription/profile view
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProfileResponse {
    /// Updated access info
    pub subscription: SubscriptionInfo,
}

/// Profile routes handler
pub struct ProfileRoutes;

impl ProfileRoutes {
    /// Create all profile routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/profile", put(Self::update_profile))
            .with_state(resources)
    }

    /// Update the caller's display name and avatar
    async fn update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<UpdateProfileRequest>,
    ) -> Result<Response, AppError> {
        let auth = super::authenticate(&headers, &resources)?;

        if request.full_name.is_none() && request.avatar_url.is_none() {
            return Err(AppError::invalid_input("Nothing to update"));
        }

        let updated = resources
            .database
            .update_profile_fields(
                auth.user_id,
                request.full_name.as_deref(),
                request.avatar_url.as_deref(),
            )
            .await?;

        if !updated {
            return Err(AppError::not_found("Profile"));
        }

        let profile = resources.database.get_profile(auth.user_id).await?;
        let response = UpdateProfileResponse {
            subscription: SubscriptionInfo::current(profile.as_ref()),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }
}
