// ABOUTME: Centralized resource container for dependency injection
// ABOUTME: Shared database, auth, billing, and provider handles behind one Arc
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! # Server Resources
//!
//! All shared server resources in one container, cloned into routers as
//! axum state. Expensive objects are created once and Arc-shared.

use crate::auth::AuthManager;
use crate::billing::StripeClient;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::llm::AssistantProvider;
use std::sync::Arc;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Database handle
    pub database: Arc<Database>,
    /// Session token manager
    pub auth_manager: Arc<AuthManager>,
    /// Stripe API client
    pub stripe: Arc<StripeClient>,
    /// Assistant response provider
    pub provider: Arc<dyn AssistantProvider>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Create server resources with proper Arc sharing
    #[must_use]
    pub fn new(
        database: Database,
        auth_manager: AuthManager,
        provider: Arc<dyn AssistantProvider>,
        config: Arc<ServerConfig>,
    ) -> Self {
        let stripe = Arc::new(StripeClient::new(&config.stripe));
        Self {
            database: Arc::new(database),
            auth_manager: Arc::new(auth_manager),
            stripe,
            provider,
            config,
        }
    }
}
