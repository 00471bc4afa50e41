// ABOUTME: Billing integration: Stripe REST client and webhook verification
// ABOUTME: The profile row is mutated only through webhook events and checkout setup
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! # Billing
//!
//! Stripe integration split in two: an outbound REST client for checkout
//! setup, and inbound webhook parsing/verification for subscription
//! lifecycle events.

/// Outbound Stripe REST client
pub mod client;
/// Inbound webhook signature verification and event types
pub mod webhook;

pub use client::{CheckoutSession, Customer, StripeClient, Subscription};
pub use webhook::{
    build_signature_header, verify_signature, CheckoutSessionObject, SubscriptionObject,
    WebhookEvent,
};
