// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory database, test resources, and user/subscription fixtures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]

//! Shared test utilities for `leger-server`
//!
//! Common setup functions to reduce duplication across integration tests.

use chrono::{Duration, Utc};
use leger_server::{
    auth::{generate_jwt_secret, AuthManager},
    config::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig, StripeConfig},
    database::Database,
    llm::DemoProvider,
    models::{PlanTier, User},
    resources::ServerResources,
};
use std::sync::{Arc, Once};
use uuid::Uuid;

/// Webhook signing secret used by all tests
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

/// Standard test configuration
///
/// The Stripe base URL defaults to an unroutable local address so a test
/// that unexpectedly calls out fails fast instead of hitting the network.
pub fn test_config(stripe_base_url: &str) -> ServerConfig {
    ServerConfig {
        http_port: 0,
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
        },
        auth: AuthConfig {
            jwt_secret: hex::encode(generate_jwt_secret()),
            jwt_expiry_hours: 24,
        },
        stripe: StripeConfig {
            secret_key: "sk_test_key".into(),
            webhook_secret: TEST_WEBHOOK_SECRET.into(),
            price_base: "price_base_test".into(),
            price_ultra: "price_ultra_test".into(),
            api_base_url: stripe_base_url.into(),
        },
        app: AppConfig {
            site_url: "http://localhost:3000".into(),
        },
    }
}

/// Standard test resources over an in-memory database
pub async fn create_test_resources() -> Arc<ServerResources> {
    create_test_resources_with_stripe("http://127.0.0.1:1").await
}

/// Test resources with a custom Stripe API base URL (mock server tests)
pub async fn create_test_resources_with_stripe(stripe_base_url: &str) -> Arc<ServerResources> {
    init_test_logging();

    let config = Arc::new(test_config(stripe_base_url));
    let database = Database::new(&config.database.url)
        .await
        .expect("in-memory database setup failed");
    let auth_manager = AuthManager::new(
        hex::decode(&config.auth.jwt_secret).expect("valid hex secret"),
        config.auth.jwt_expiry_hours,
    );

    Arc::new(ServerResources::new(
        database,
        auth_manager,
        Arc::new(DemoProvider::new()),
        config,
    ))
}

/// Create a test user with a default (inactive) profile
///
/// Returns the user and a ready-to-send `Bearer` header value. The password
/// hash is a placeholder; login-path tests register through the API instead.
pub async fn create_test_user(resources: &ServerResources) -> (User, String) {
    let unique = Uuid::new_v4().simple();
    let user = User::new(
        format!("user-{unique}@leger.ai"),
        "placeholder-hash".into(),
        Some("Test User".into()),
    );
    resources
        .database
        .create_user(&user)
        .await
        .expect("user creation failed");

    let token = resources
        .auth_manager
        .generate_token(&user)
        .expect("token generation failed");

    (user, format!("Bearer {token}"))
}

/// Give a user an active subscription for the given tier, ending in 30 days
pub async fn activate_subscription(resources: &ServerResources, user_id: Uuid, tier: PlanTier) {
    resources
        .database
        .activate_subscription(
            user_id,
            tier,
            Utc::now() + Duration::days(30),
            "sub_test_subscription",
        )
        .await
        .expect("subscription activation failed");
}

/// Create a test user with an active subscription
pub async fn create_subscribed_user(
    resources: &ServerResources,
    tier: PlanTier,
) -> (User, String) {
    let (user, auth) = create_test_user(resources).await;
    activate_subscription(resources, user.id, tier).await;
    (user, auth)
}
