// ABOUTME: Domain models for users, profiles, and subscription state
// ABOUTME: Shared data structures used by routes, database, and the conversation controller
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! Common data structures for the Léger server

/// Subscription profile models and derived access info
pub mod profile;
/// User account models
pub mod user;

pub use profile::{PlanTier, Profile, SubscriptionInfo, SubscriptionStatus};
pub use user::User;
