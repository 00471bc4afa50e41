// ABOUTME: HTTP route groups and top-level router assembly
// ABOUTME: Each group owns its paths and handlers; the server merges them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! HTTP routes for the Léger server

/// Registration, login, and current-user routes
pub mod auth;
/// Checkout and webhook routes
pub mod billing;
/// Demo streaming endpoint and chat session routes
pub mod chat;
/// Profile edit routes
pub mod profile;

use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::http::HeaderMap;
use axum::Router;
use std::sync::Arc;

/// Assemble the full application router
#[must_use]
pub fn router(resources: Arc<ServerResources>) -> Router {
    Router::new()
        .merge(auth::AuthRoutes::routes(resources.clone()))
        .merge(chat::ChatRoutes::routes(resources.clone()))
        .merge(billing::BillingRoutes::routes(resources.clone()))
        .merge(profile::ProfileRoutes::routes(resources))
}

/// Authenticate a request from its `authorization` header
///
/// # Errors
///
/// Returns an error when the header is missing or the token is invalid
pub(crate) fn authenticate(
    headers: &HeaderMap,
    resources: &ServerResources,
) -> Result<crate::auth::AuthResult, AppError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::auth_invalid("Missing authorization header"))?;

    resources.auth_manager.authenticate_header(auth_header)
}
