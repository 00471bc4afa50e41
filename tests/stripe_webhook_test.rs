// ABOUTME: Integration tests for billing routes: checkout creation and the webhook
// ABOUTME: Uses a local mock Stripe server; signatures built with the real signer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::{
    activate_subscription, create_test_resources, create_test_resources_with_stripe,
    create_test_user, TEST_WEBHOOK_SECRET,
};
use helpers::axum_test::AxumTestRequest;
use leger_server::billing::build_signature_header;
use leger_server::models::{PlanTier, SubscriptionStatus};
use leger_server::routes::billing::{BillingRoutes, CreateCheckoutResponse};

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::json;
use std::sync::{Arc, Mutex};

// ============================================================================
// Mock Stripe Server
// ============================================================================

type CapturedForm = Arc<Mutex<Option<Vec<(String, String)>>>>;

fn mock_stripe_router(period_end: i64, checkout_form: CapturedForm) -> Router {
    Router::new()
        .route(
            "/v1/customers",
            post(|| async { Json(json!({"id": "cus_mock"})) }),
        )
        .route(
            "/v1/checkout/sessions",
            post(move |body: String| {
                let checkout_form = checkout_form.clone();
                async move {
                    let form: Vec<(String, String)> = serde_urlencoded::from_str(&body).unwrap();
                    *checkout_form.lock().unwrap() = Some(form);
                    Json(json!({"id": "cs_mock", "url": "https://checkout.stripe.test/cs_mock"}))
                }
            }),
        )
        .route(
            "/v1/subscriptions/:id",
            get(move |Path(id): Path<String>| async move {
                Json(json!({
                    "id": id,
                    "status": "active",
                    "current_period_end": period_end,
                    "metadata": {}
                }))
            }),
        )
}

async fn spawn_mock_stripe(period_end: i64) -> (String, CapturedForm) {
    let checkout_form: CapturedForm = Arc::new(Mutex::new(None));
    let router = mock_stripe_router(period_end, checkout_form.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), checkout_form)
}

fn signed_webhook(payload: &str) -> AxumTestRequest {
    let header = build_signature_header(payload, TEST_WEBHOOK_SECRET, Utc::now().timestamp());
    AxumTestRequest::post("/api/stripe/webhook")
        .header("stripe-signature", &header)
        .raw_body(payload)
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn test_create_checkout_requires_authentication() {
    let resources = create_test_resources().await;
    let router = BillingRoutes::routes(resources);

    let response = AxumTestRequest::post("/api/stripe/create-checkout")
        .json(&json!({"tier": "base"}))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_checkout_rejects_invalid_tier() {
    let resources = create_test_resources().await;
    let (_user, auth) = create_test_user(&resources).await;
    let router = BillingRoutes::routes(resources);

    let response = AxumTestRequest::post("/api/stripe/create-checkout")
        .header("authorization", &auth)
        .json(&json!({"tier": "enterprise"}))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_checkout_creates_customer_and_session() {
    let (stripe_base, checkout_form) =
        spawn_mock_stripe(Utc::now().timestamp() + 30 * 86_400).await;
    let resources = create_test_resources_with_stripe(&stripe_base).await;
    let (user, auth) = create_test_user(&resources).await;
    let router = BillingRoutes::routes(resources.clone());

    let response = AxumTestRequest::post("/api/stripe/create-checkout")
        .header("authorization", &auth)
        .json(&json!({"tier": "ultra"}))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let checkout: CreateCheckoutResponse = response.json();
    assert_eq!(checkout.session_id, "cs_mock");
    assert_eq!(
        checkout.url.as_deref(),
        Some("https://checkout.stripe.test/cs_mock")
    );

    // The new customer id was written back to the profile
    let profile = resources.database.get_profile(user.id).await.unwrap().unwrap();
    assert_eq!(profile.stripe_customer_id.as_deref(), Some("cus_mock"));

    // The checkout session carried the ultra price and the user metadata
    let form = checkout_form.lock().unwrap().clone().unwrap();
    let field = |name: &str| {
        form.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };
    assert_eq!(field("mode").as_deref(), Some("subscription"));
    assert_eq!(field("customer").as_deref(), Some("cus_mock"));
    assert_eq!(field("line_items[0][price]").as_deref(), Some("price_ultra_test"));
    assert_eq!(field("metadata[user_id]").as_deref(), Some(user.id.to_string().as_str()));
    assert_eq!(field("metadata[tier]").as_deref(), Some("ultra"));
    assert_eq!(
        field("success_url").as_deref(),
        Some("http://localhost:3000/?success=true")
    );
}

#[tokio::test]
async fn test_create_checkout_reuses_existing_customer() {
    let (stripe_base, _form) = spawn_mock_stripe(Utc::now().timestamp() + 30 * 86_400).await;
    let resources = create_test_resources_with_stripe(&stripe_base).await;
    let (user, auth) = create_test_user(&resources).await;
    resources
        .database
        .set_stripe_customer(user.id, "cus_existing")
        .await
        .unwrap();
    let router = BillingRoutes::routes(resources.clone());

    let response = AxumTestRequest::post("/api/stripe/create-checkout")
        .header("authorization", &auth)
        .json(&json!({"tier": "base"}))
        .send(router)
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let profile = resources.database.get_profile(user.id).await.unwrap().unwrap();
    assert_eq!(profile.stripe_customer_id.as_deref(), Some("cus_existing"));
}

#[tokio::test]
async fn test_create_checkout_provider_failure_returns_500() {
    // No mock server behind this address
    let resources = create_test_resources_with_stripe("http://127.0.0.1:1").await;
    let (_user, auth) = create_test_user(&resources).await;
    let router = BillingRoutes::routes(resources);

    let response = AxumTestRequest::post("/api/stripe/create-checkout")
        .header("authorization", &auth)
        .json(&json!({"tier": "base"}))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}

// ============================================================================
// Webhook: signature handling
// ============================================================================

#[tokio::test]
async fn test_webhook_missing_signature_rejected() {
    let resources = create_test_resources().await;
    let router = BillingRoutes::routes(resources);

    let response = AxumTestRequest::post("/api/stripe/webhook")
        .raw_body("{}")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Invalid signature");
}

#[tokio::test]
async fn test_webhook_invalid_signature_rejected_without_mutation() {
    let resources = create_test_resources().await;
    let (user, _auth) = create_test_user(&resources).await;
    activate_subscription(&resources, user.id, PlanTier::Ultra).await;
    let router = BillingRoutes::routes(resources.clone());

    let payload = json!({
        "id": "evt_bad",
        "type": "customer.subscription.deleted",
        "data": {"object": {
            "id": "sub_test_subscription",
            "status": "canceled",
            "metadata": {"user_id": user.id.to_string()}
        }}
    })
    .to_string();

    let response = AxumTestRequest::post("/api/stripe/webhook")
        .header(
            "stripe-signature",
            &format!("t={},v1=deadbeefdeadbeef", Utc::now().timestamp()),
        )
        .raw_body(&payload)
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    // The profile was not touched
    let profile = resources.database.get_profile(user.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    assert!(profile.is_portal_enabled);
}

#[tokio::test]
async fn test_webhook_stale_timestamp_rejected() {
    let resources = create_test_resources().await;
    let router = BillingRoutes::routes(resources);

    let payload = json!({"id": "evt_old", "type": "ping", "data": {"object": {}}}).to_string();
    let stale = Utc::now().timestamp() - 3600;
    let header = build_signature_header(&payload, TEST_WEBHOOK_SECRET, stale);

    let response = AxumTestRequest::post("/api/stripe/webhook")
        .header("stripe-signature", &header)
        .raw_body(&payload)
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Webhook: event processing
// ============================================================================

#[tokio::test]
async fn test_webhook_unknown_event_accepted_and_ignored() {
    let resources = create_test_resources().await;
    let (user, _auth) = create_test_user(&resources).await;
    let router = BillingRoutes::routes(resources.clone());

    let payload = json!({
        "id": "evt_misc",
        "type": "invoice.finalized",
        "data": {"object": {"id": "in_1"}}
    })
    .to_string();

    let response = signed_webhook(&payload).send(router).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["received"], true);

    let profile = resources.database.get_profile(user.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Inactive);
}

#[tokio::test]
async fn test_webhook_checkout_completed_activates_tier() {
    let period_end = Utc::now().timestamp() + 30 * 86_400;
    let (stripe_base, _form) = spawn_mock_stripe(period_end).await;
    let resources = create_test_resources_with_stripe(&stripe_base).await;
    let (user, _auth) = create_test_user(&resources).await;
    let router = BillingRoutes::routes(resources.clone());

    let payload = json!({
        "id": "evt_checkout",
        "type": "checkout.session.completed",
        "data": {"object": {
            "id": "cs_done",
            "subscription": "sub_new",
            "metadata": {"user_id": user.id.to_string(), "tier": "ultra"}
        }}
    })
    .to_string();

    let response = signed_webhook(&payload).send(router).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let profile = resources.database.get_profile(user.id).await.unwrap().unwrap();
    assert_eq!(profile.tier, PlanTier::Ultra);
    assert_eq!(profile.subscription_status, SubscriptionStatus::Active);
    assert!(profile.is_portal_enabled);
    assert_eq!(profile.stripe_subscription_id.as_deref(), Some("sub_new"));
    assert_eq!(
        profile.subscription_end_date.map(|d| d.timestamp()),
        Some(period_end)
    );
}

#[tokio::test]
async fn test_webhook_subscription_updated_mirrors_status() {
    let resources = create_test_resources().await;
    let (user, _auth) = create_test_user(&resources).await;
    activate_subscription(&resources, user.id, PlanTier::Base).await;
    let router = BillingRoutes::routes(resources.clone());

    let new_period_end = Utc::now().timestamp() + 60 * 86_400;
    let payload = json!({
        "id": "evt_update",
        "type": "customer.subscription.updated",
        "data": {"object": {
            "id": "sub_test_subscription",
            "status": "past_due",
            "current_period_end": new_period_end,
            "metadata": {"user_id": user.id.to_string()}
        }}
    })
    .to_string();

    let response = signed_webhook(&payload).send(router).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let profile = resources.database.get_profile(user.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Inactive);
    assert_eq!(
        profile.subscription_end_date.map(|d| d.timestamp()),
        Some(new_period_end)
    );
}

#[tokio::test]
async fn test_webhook_subscription_deleted_cancels_and_revokes_portal() {
    let resources = create_test_resources().await;
    let (user, _auth) = create_test_user(&resources).await;
    activate_subscription(&resources, user.id, PlanTier::Ultra).await;
    let router = BillingRoutes::routes(resources.clone());

    let payload = json!({
        "id": "evt_delete",
        "type": "customer.subscription.deleted",
        "data": {"object": {
            "id": "sub_test_subscription",
            "status": "canceled",
            "metadata": {"user_id": user.id.to_string()}
        }}
    })
    .to_string();

    let response = signed_webhook(&payload).send(router).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let profile = resources.database.get_profile(user.id).await.unwrap().unwrap();
    assert_eq!(profile.subscription_status, SubscriptionStatus::Cancelled);
    assert!(!profile.is_portal_enabled);
    // The tier itself is retained for display; access is gated by status
    assert_eq!(profile.tier, PlanTier::Ultra);
}
