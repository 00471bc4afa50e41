// ABOUTME: Environment-based server configuration with validation
// ABOUTME: All runtime settings come from environment variables, never config files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! # Server Configuration
//!
//! Environment-only configuration for the Léger server. Every setting has a
//! development default so `leger-server` starts with nothing but a shell;
//! production deployments set the Stripe and JWT secrets explicitly.

use crate::constants::limits;
use crate::errors::{AppError, AppResult};
use crate::models::PlanTier;
use serde::{Deserialize, Serialize};
use std::env;

/// Complete server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Authentication configuration
    pub auth: AuthConfig,
    /// Stripe billing configuration
    pub stripe: StripeConfig,
    /// Application behavior settings
    pub app: AppConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL (SQLite path or `sqlite::memory:`)
    pub url: String,
}

/// Authentication settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret used to sign session JWTs
    pub jwt_secret: String,
    /// JWT expiry time in hours
    pub jwt_expiry_hours: i64,
}

/// Stripe billing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StripeConfig {
    /// Stripe secret API key
    pub secret_key: String,
    /// Webhook signing secret
    pub webhook_secret: String,
    /// Price identifier for the Base plan
    pub price_base: String,
    /// Price identifier for the Ultra plan
    pub price_ultra: String,
    /// Stripe API base URL, overridable for tests
    pub api_base_url: String,
}

impl StripeConfig {
    /// Price identifier for a plan tier
    #[must_use]
    pub fn price_id(&self, tier: PlanTier) -> &str {
        match tier {
            PlanTier::Base => &self.price_base,
            PlanTier::Ultra => &self.price_ultra,
        }
    }
}

/// Application behavior settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Public site origin used to build checkout redirect URLs
    pub site_url: String,
}

impl AppConfig {
    /// Redirect target after a successful checkout
    #[must_use]
    pub fn checkout_success_url(&self) -> String {
        format!("{}/?success=true", self.site_url)
    }

    /// Redirect target after an abandoned checkout
    #[must_use]
    pub fn checkout_cancel_url(&self) -> String {
        format!("{}/pricing?canceled=true", self.site_url)
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable fails to parse (e.g. a non-numeric
    /// port). Unset variables fall back to development defaults.
    pub fn from_env() -> AppResult<Self> {
        let http_port = match env::var("HTTP_PORT") {
            Ok(value) => value
                .parse()
                .map_err(|_| AppError::config(format!("Invalid HTTP_PORT: {value}")))?,
            Err(_) => 8080,
        };

        let jwt_expiry_hours = match env::var("JWT_EXPIRY_HOURS") {
            Ok(value) => value
                .parse()
                .map_err(|_| AppError::config(format!("Invalid JWT_EXPIRY_HOURS: {value}")))?,
            Err(_) => limits::DEFAULT_SESSION_HOURS,
        };

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set, generating an ephemeral secret");
            hex::encode(crate::auth::generate_jwt_secret())
        });

        Ok(Self {
            http_port,
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:data/leger.db".into()),
            },
            auth: AuthConfig {
                jwt_secret,
                jwt_expiry_hours,
            },
            stripe: StripeConfig {
                secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
                webhook_secret: env::var("STRIPE_WEBHOOK_SECRET").unwrap_or_default(),
                price_base: env::var("STRIPE_PRICE_BASE").unwrap_or_default(),
                price_ultra: env::var("STRIPE_PRICE_ULTRA").unwrap_or_default(),
                api_base_url: env::var("STRIPE_API_BASE")
                    .unwrap_or_else(|_| "https://api.stripe.com".into()),
            },
            app: AppConfig {
                site_url: env::var("SITE_URL").unwrap_or_else(|_| "http://localhost:3000".into()),
            },
        })
    }

    /// One-line startup summary with secrets masked
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "http_port={} database={} stripe_configured={} site_url={}",
            self.http_port,
            self.database.url,
            !self.stripe.secret_key.is_empty(),
            self.app.site_url,
        )
    }
}
