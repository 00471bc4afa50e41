// ABOUTME: Access-gate checks run before every chat action
// ABOUTME: Failed checks route to UI prompts, never to errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! # Access Gate
//!
//! Ordered checks over the authentication and subscription state:
//! authentication, then active subscription, then (for portal mode) the
//! Ultra tier. Each failed check names the UI prompt to show; transitions
//! between the underlying states are driven by the identity and billing
//! providers, not by this module.

use crate::llm::ChatMode;
use crate::models::{PlanTier, SubscriptionInfo};
use serde::{Deserialize, Serialize};

/// Access state a user can be in, derived from identity and billing data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessState {
    /// No authenticated user
    Anonymous,
    /// Authenticated, no active subscription
    NoSubscription,
    /// Authenticated with an active Base subscription
    Base,
    /// Authenticated with an active Ultra subscription
    Ultra,
}

/// Outcome of a gate check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GateOutcome {
    /// All checks passed
    Allowed,
    /// Show the sign-in modal
    ShowSignIn,
    /// Show the upgrade modal
    ShowUpgrade,
}

/// Stateless gate evaluating access checks in fixed order
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    /// Classify the current access state
    #[must_use]
    pub fn state(authenticated: bool, info: &SubscriptionInfo) -> AccessState {
        if !authenticated {
            return AccessState::Anonymous;
        }
        if !info.has_subscription {
            return AccessState::NoSubscription;
        }
        match info.tier {
            Some(PlanTier::Ultra) => AccessState::Ultra,
            _ => AccessState::Base,
        }
    }

    /// Run the gate checks for a chat action in the given mode
    ///
    /// Check order is fixed: authentication, active subscription, then the
    /// Ultra tier for portal mode specifically.
    #[must_use]
    pub fn check(authenticated: bool, info: &SubscriptionInfo, mode: ChatMode) -> GateOutcome {
        match Self::state(authenticated, info) {
            AccessState::Anonymous => GateOutcome::ShowSignIn,
            AccessState::NoSubscription => GateOutcome::ShowUpgrade,
            AccessState::Base => {
                if mode == ChatMode::Portal {
                    GateOutcome::ShowUpgrade
                } else {
                    GateOutcome::Allowed
                }
            }
            AccessState::Ultra => GateOutcome::Allowed,
        }
    }
}
