// ABOUTME: Billing route handlers: checkout session creation and the Stripe webhook
// ABOUTME: Webhook signatures are verified before any profile mutation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! Billing routes

use crate::{
    billing::{verify_signature, CheckoutSessionObject, SubscriptionObject, WebhookEvent},
    billing::client::CheckoutParams,
    errors::{AppError, AppResult},
    models::{PlanTier, SubscriptionStatus},
    resources::ServerResources,
};
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body of `POST /api/stripe/create-checkout`
#[derive(Debug, Deserialize)]
pub struct CreateCheckoutRequest {
    /// Plan tier being purchased
    pub tier: String,
}

/// Response with the created checkout session
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCheckoutResponse {
    /// Checkout session id
    #[serde(rename = "sessionId")]
    pub session_id: String,
    /// Hosted checkout URL
    pub url: Option<String>,
}

// ============================================================================
// Billing Routes
// ============================================================================

/// Billing routes handler
pub struct BillingRoutes;

impl BillingRoutes {
    /// Create all billing routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/stripe/create-checkout", post(Self::create_checkout))
            .route("/api/stripe/webhook", post(Self::webhook))
            .with_state(resources)
    }

    // ========================================================================
    // Checkout
    // ========================================================================

    /// Create a subscription checkout session for the authenticated user
    async fn create_checkout(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Json(request): Json<CreateCheckoutRequest>,
    ) -> Result<Response, AppError> {
        let auth = super::authenticate(&headers, &resources)?;
        let tier = PlanTier::from_str(&request.tier)?;

        let profile = resources
            .database
            .get_profile(auth.user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Profile"))?;

        // Reuse the Stripe customer when one exists, create it otherwise
        let customer_id = match profile.stripe_customer_id {
            Some(customer_id) => customer_id,
            None => {
                let customer = resources
                    .stripe
                    .create_customer(&auth.email, auth.user_id)
                    .await
                    .map_err(|e| AppError::internal(format!("Failed to create customer: {e}")))?;
                resources
                    .database
                    .set_stripe_customer(auth.user_id, &customer.id)
                    .await?;
                customer.id
            }
        };

        let success_url = resources.config.app.checkout_success_url();
        let cancel_url = resources.config.app.checkout_cancel_url();
        let session = resources
            .stripe
            .create_checkout_session(CheckoutParams {
                customer_id: &customer_id,
                price_id: resources.config.stripe.price_id(tier),
                success_url: &success_url,
                cancel_url: &cancel_url,
                user_id: auth.user_id,
                tier,
            })
            .await
            .map_err(|e| AppError::internal(format!("Failed to create checkout session: {e}")))?;

        info!(user_id = %auth.user_id, tier = %tier, "checkout session created");

        Ok((
            StatusCode::OK,
            Json(CreateCheckoutResponse {
                session_id: session.id,
                url: session.url,
            }),
        )
            .into_response())
    }

    // ========================================================================
    // Webhook
    // ========================================================================

    /// Consume a signed lifecycle event from the billing provider
    ///
    /// Invalid signatures are rejected with 400 and cause no mutation; the
    /// provider handles redelivery, so nothing is retried locally.
    /// Unrecognized event types are accepted and ignored.
    async fn webhook(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: String,
    ) -> Response {
        let Some(signature) = headers.get("stripe-signature").and_then(|h| h.to_str().ok())
        else {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid signature"})),
            )
                .into_response();
        };

        if let Err(e) = verify_signature(
            &body,
            signature,
            &resources.config.stripe.webhook_secret,
            Utc::now().timestamp(),
        ) {
            warn!("webhook signature verification failed: {e}");
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "Invalid signature"})),
            )
                .into_response();
        }

        let event: WebhookEvent = match serde_json::from_str(&body) {
            Ok(event) => event,
            Err(e) => {
                warn!("webhook payload rejected: {e}");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": "Invalid payload"})),
                )
                    .into_response();
            }
        };

        match Self::process_event(&resources, &event).await {
            Ok(()) => {
                (StatusCode::OK, Json(serde_json::json!({"received": true}))).into_response()
            }
            Err(e) => {
                warn!("error processing webhook: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": e.message})),
                )
                    .into_response()
            }
        }
    }

    async fn process_event(resources: &ServerResources, event: &WebhookEvent) -> AppResult<()> {
        match event.event_type.as_str() {
            "checkout.session.completed" => {
                Self::handle_checkout_completed(resources, &event.checkout_session()?).await
            }
            "customer.subscription.updated" => {
                Self::handle_subscription_updated(resources, &event.subscription()?).await
            }
            "customer.subscription.deleted" => {
                Self::handle_subscription_deleted(resources, &event.subscription()?).await
            }
            other => {
                info!("Unhandled event type: {other}");
                Ok(())
            }
        }
    }

    /// Activate the purchased tier once checkout completes
    async fn handle_checkout_completed(
        resources: &ServerResources,
        session: &CheckoutSessionObject,
    ) -> AppResult<()> {
        let Some(user_id) = Self::metadata_user_id(&session.metadata) else {
            warn!(session = %session.id, "checkout completed without user metadata");
            return Ok(());
        };
        let Some(ref subscription_id) = session.subscription else {
            warn!(session = %session.id, "checkout completed without a subscription");
            return Ok(());
        };

        // The event itself carries no billing period; fetch the subscription
        // for the renewal date
        let subscription = resources
            .stripe
            .retrieve_subscription(subscription_id)
            .await?;

        let tier = session
            .metadata
            .get("tier")
            .and_then(|t| PlanTier::from_str(t).ok())
            .unwrap_or(PlanTier::Base);
        let end_date = period_end_timestamp(subscription.current_period_end)?;

        resources
            .database
            .activate_subscription(user_id, tier, end_date, &subscription.id)
            .await?;

        info!(%user_id, %tier, "subscription activated");
        Ok(())
    }

    /// Mirror a status change onto the profile
    async fn handle_subscription_updated(
        resources: &ServerResources,
        subscription: &SubscriptionObject,
    ) -> AppResult<()> {
        let Some(user_id) = Self::metadata_user_id(&subscription.metadata) else {
            warn!(subscription = %subscription.id, "subscription update without user metadata");
            return Ok(());
        };

        let status = if subscription.status == "active" {
            SubscriptionStatus::Active
        } else {
            SubscriptionStatus::Inactive
        };
        let end_date = subscription
            .current_period_end
            .map(period_end_timestamp)
            .transpose()?;

        resources
            .database
            .update_subscription_status(user_id, status, end_date)
            .await?;

        info!(%user_id, %status, "subscription updated");
        Ok(())
    }

    /// Mark the subscription cancelled and revoke portal access
    async fn handle_subscription_deleted(
        resources: &ServerResources,
        subscription: &SubscriptionObject,
    ) -> AppResult<()> {
        let Some(user_id) = Self::metadata_user_id(&subscription.metadata) else {
            warn!(subscription = %subscription.id, "subscription delete without user metadata");
            return Ok(());
        };

        resources.database.cancel_subscription(user_id).await?;

        info!(%user_id, "subscription cancelled");
        Ok(())
    }

    fn metadata_user_id(
        metadata: &std::collections::HashMap<String, String>,
    ) -> Option<Uuid> {
        metadata.get("user_id").and_then(|id| Uuid::parse_str(id).ok())
    }
}

fn period_end_timestamp(unix_seconds: i64) -> AppResult<DateTime<Utc>> {
    DateTime::from_timestamp(unix_seconds, 0)
        .ok_or_else(|| AppError::invalid_input("Invalid billing period end timestamp"))
}
