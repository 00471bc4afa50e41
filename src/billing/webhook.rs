// ABOUTME: Stripe webhook signature verification and event payload types
// ABOUTME: HMAC-SHA256 over "timestamp.payload", constant-time comparison via ring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use crate::constants::webhook::SIGNATURE_TOLERANCE_SECS;
use crate::errors::{AppError, AppResult};
use ring::hmac;
use serde::Deserialize;
use std::collections::HashMap;

/// A signed webhook event envelope
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event id (`evt_...`)
    #[serde(default)]
    pub id: Option<String>,
    /// Event type, e.g. `checkout.session.completed`
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload
    pub data: EventData,
}

/// Payload wrapper carrying the event's object
#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    /// The object the event describes; shape depends on the event type
    pub object: serde_json::Value,
}

impl WebhookEvent {
    /// Interpret the payload as a checkout session
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not match the expected shape
    pub fn checkout_session(&self) -> AppResult<CheckoutSessionObject> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| AppError::invalid_input(format!("Invalid checkout session object: {e}")))
    }

    /// Interpret the payload as a subscription
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not match the expected shape
    pub fn subscription(&self) -> AppResult<SubscriptionObject> {
        serde_json::from_value(self.data.object.clone())
            .map_err(|e| AppError::invalid_input(format!("Invalid subscription object: {e}")))
    }
}

/// Checkout session fields read from `checkout.session.completed`
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSessionObject {
    /// Session id
    pub id: String,
    /// Subscription created by this checkout, if any
    #[serde(default)]
    pub subscription: Option<String>,
    /// Metadata stamped at session creation
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Subscription fields read from `customer.subscription.*` events
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionObject {
    /// Subscription id
    pub id: String,
    /// Provider-side status
    pub status: String,
    /// Unix timestamp of the current billing period end
    #[serde(default)]
    pub current_period_end: Option<i64>,
    /// Metadata stamped at subscription creation
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Parsed `stripe-signature` header
#[derive(Debug, Clone)]
struct SignatureHeader {
    timestamp: i64,
    v1_signatures: Vec<String>,
}

fn parse_signature_header(header: &str) -> AppResult<SignatureHeader> {
    let mut timestamp = None;
    let mut v1_signatures = Vec::new();

    for part in header.split(',') {
        let mut kv = part.trim().splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(value)) => {
                timestamp = value.parse().ok();
            }
            (Some("v1"), Some(value)) => {
                v1_signatures.push(value.to_owned());
            }
            // Unknown schemes (v0, future versions) are ignored
            _ => {}
        }
    }

    let timestamp = timestamp
        .ok_or_else(|| AppError::invalid_input("Signature header missing timestamp"))?;
    if v1_signatures.is_empty() {
        return Err(AppError::invalid_input("Signature header missing v1 signature"));
    }

    Ok(SignatureHeader {
        timestamp,
        v1_signatures,
    })
}

fn compute_signature(secret: &str, timestamp: i64, payload: &str) -> hmac::Tag {
    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    hmac::sign(&key, format!("{timestamp}.{payload}").as_bytes())
}

/// Verify a webhook payload against its `stripe-signature` header
///
/// The signed content is `"{timestamp}.{payload}"`; comparison is
/// constant-time. Events older than the tolerance window are rejected even
/// with a valid signature.
///
/// # Errors
///
/// Returns an error if the header is malformed, the timestamp is outside
/// the tolerance window, or no candidate signature matches
pub fn verify_signature(payload: &str, header: &str, secret: &str, now: i64) -> AppResult<()> {
    let parsed = parse_signature_header(header)?;

    if (now - parsed.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(AppError::invalid_input(
            "Signature timestamp outside tolerance",
        ));
    }

    let key = hmac::Key::new(hmac::HMAC_SHA256, secret.as_bytes());
    let signed_payload = format!("{}.{payload}", parsed.timestamp);

    for candidate in &parsed.v1_signatures {
        let Ok(candidate_bytes) = hex::decode(candidate) else {
            continue;
        };
        if hmac::verify(&key, signed_payload.as_bytes(), &candidate_bytes).is_ok() {
            return Ok(());
        }
    }

    Err(AppError::invalid_input("Invalid signature"))
}

/// Build a valid `stripe-signature` header for a payload
///
/// Used by tests and local tooling to emit events the webhook accepts.
#[must_use]
pub fn build_signature_header(payload: &str, secret: &str, timestamp: i64) -> String {
    let tag = compute_signature(secret, timestamp, payload);
    format!("t={timestamp},v1={}", hex::encode(tag.as_ref()))
}
