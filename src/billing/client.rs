// ABOUTME: Minimal Stripe REST client: customers, checkout sessions, subscriptions
// ABOUTME: Form-encoded requests, bearer-authenticated, base URL overridable for tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use crate::config::StripeConfig;
use crate::errors::{AppError, AppResult};
use crate::models::PlanTier;
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

/// A Stripe customer, as much of it as this service reads
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Customer id (`cus_...`)
    pub id: String,
}

/// A Stripe Checkout session
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session id (`cs_...`)
    pub id: String,
    /// Hosted checkout URL to redirect the user to
    pub url: Option<String>,
}

/// A Stripe subscription
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    /// Subscription id (`sub_...`)
    pub id: String,
    /// Provider-side status (`active`, `past_due`, ...)
    pub status: String,
    /// Unix timestamp of the current billing period end
    pub current_period_end: i64,
    /// Metadata attached at creation
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Parameters for creating a subscription checkout session
#[derive(Debug, Clone)]
pub struct CheckoutParams<'a> {
    /// Stripe customer id
    pub customer_id: &'a str,
    /// Price id of the purchased plan
    pub price_id: &'a str,
    /// Redirect after successful payment
    pub success_url: &'a str,
    /// Redirect after abandoning checkout
    pub cancel_url: &'a str,
    /// Purchasing user, stamped into session metadata
    pub user_id: Uuid,
    /// Purchased tier, stamped into session metadata
    pub tier: PlanTier,
}

/// Minimal Stripe API client
#[derive(Debug, Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeClient {
    /// Create a client from configuration
    #[must_use]
    pub fn new(config: &StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            secret_key: config.secret_key.clone(),
            base_url: config.api_base_url.trim_end_matches('/').to_owned(),
        }
    }

    /// Create a Stripe customer for a user
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it
    pub async fn create_customer(&self, email: &str, user_id: Uuid) -> AppResult<Customer> {
        let params = [
            ("email", email.to_owned()),
            ("metadata[user_id]", user_id.to_string()),
        ];
        self.post_form("/v1/customers", &params).await
    }

    /// Create a subscription-mode checkout session
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it
    pub async fn create_checkout_session(
        &self,
        params: CheckoutParams<'_>,
    ) -> AppResult<CheckoutSession> {
        let form = [
            ("customer", params.customer_id.to_owned()),
            ("mode", "subscription".to_owned()),
            ("payment_method_types[0]", "card".to_owned()),
            ("line_items[0][price]", params.price_id.to_owned()),
            ("line_items[0][quantity]", "1".to_owned()),
            ("success_url", params.success_url.to_owned()),
            ("cancel_url", params.cancel_url.to_owned()),
            ("metadata[user_id]", params.user_id.to_string()),
            ("metadata[tier]", params.tier.as_str().to_owned()),
        ];
        self.post_form("/v1/checkout/sessions", &form).await
    }

    /// Retrieve a subscription by id
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it
    pub async fn retrieve_subscription(&self, subscription_id: &str) -> AppResult<Subscription> {
        let url = format!("{}/v1/subscriptions/{subscription_id}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::external_service("stripe", e.to_string()))?;

        Self::parse_response(response).await
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> AppResult<T> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::external_service("stripe", e.to_string()))?;

        Self::parse_response(response).await
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> AppResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::external_service("stripe", e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(status = %status, "stripe request failed: {body}");
            return Err(AppError::external_service(
                "stripe",
                format!("request failed with status {status}"),
            ));
        }

        serde_json::from_str(&body)
            .map_err(|e| AppError::external_service("stripe", format!("invalid response: {e}")))
    }
}
