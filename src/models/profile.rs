// ABOUTME: Subscription profile models: plan tiers, statuses, and derived access info
// ABOUTME: The profile row is the single source of truth for access-control decisions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Subscription plan tier
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Essential plan
    Base,
    /// Premium plan, unlocks Portal Mode
    Ultra,
}

impl PlanTier {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Ultra => "ultra",
        }
    }
}

impl Display for PlanTier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "base" => Ok(Self::Base),
            "ultra" => Ok(Self::Ultra),
            _ => Err(AppError::invalid_input(format!("Invalid tier: {s}"))),
        }
    }
}

/// Subscription lifecycle status, mirrored from the billing provider
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    /// Paid and current
    Active,
    /// Never subscribed, or lapsed at the provider
    #[default]
    Inactive,
    /// Explicitly cancelled
    Cancelled,
}

impl SubscriptionStatus {
    /// Convert to string for database storage
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Cancelled => "cancelled",
        }
    }
}

impl Display for SubscriptionStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(AppError::invalid_input(format!(
                "Invalid subscription status: {s}"
            ))),
        }
    }
}

/// Per-user subscription profile row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Owning user id
    pub user_id: Uuid,
    /// Plan tier
    pub tier: PlanTier,
    /// Subscription status
    pub subscription_status: SubscriptionStatus,
    /// When the current billing period ends, if known
    pub subscription_end_date: Option<DateTime<Utc>>,
    /// Stripe customer id, set on first checkout
    pub stripe_customer_id: Option<String>,
    /// Stripe subscription id, set on activation
    pub stripe_subscription_id: Option<String>,
    /// Whether Portal Mode is unlocked
    pub is_portal_enabled: bool,
    /// Display name shown in the UI
    pub full_name: Option<String>,
    /// Avatar image reference
    pub avatar_url: Option<String>,
    /// Last mutation timestamp
    pub updated_at: DateTime<Utc>,
}

impl Profile {
    /// Default profile created alongside a new user: Base tier, inactive
    #[must_use]
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            tier: PlanTier::Base,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_end_date: None,
            stripe_customer_id: None,
            stripe_subscription_id: None,
            is_portal_enabled: false,
            full_name: None,
            avatar_url: None,
            updated_at: Utc::now(),
        }
    }
}

/// Derived subscription access info, the input to every gate check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    /// Whether the user currently has paid access
    pub has_subscription: bool,
    /// Plan tier, if a profile exists
    pub tier: Option<PlanTier>,
    /// Raw subscription status
    pub status: SubscriptionStatus,
    /// Billing period end, if known
    pub end_date: Option<DateTime<Utc>>,
    /// Whether Portal Mode is accessible
    pub can_use_portal: bool,
    /// Whether the subscription end date has passed
    pub is_expired: bool,
    /// Display name from the profile
    pub full_name: Option<String>,
    /// Avatar reference from the profile
    pub avatar_url: Option<String>,
}

impl SubscriptionInfo {
    /// Info for a user with no profile row: no access at all
    #[must_use]
    pub const fn none() -> Self {
        Self {
            has_subscription: false,
            tier: None,
            status: SubscriptionStatus::Inactive,
            end_date: None,
            can_use_portal: false,
            is_expired: false,
            full_name: None,
            avatar_url: None,
        }
    }

    /// Derive access info from a profile at a given instant
    ///
    /// Access requires `status == active` and an end date that is absent or
    /// in the future. Portal access additionally requires the Ultra tier.
    #[must_use]
    pub fn from_profile(profile: &Profile, now: DateTime<Utc>) -> Self {
        let is_active = profile.subscription_status == SubscriptionStatus::Active;
        let is_expired = profile
            .subscription_end_date
            .is_some_and(|end| end < now);

        let has_subscription = is_active && !is_expired;
        let can_use_portal = has_subscription && profile.tier == PlanTier::Ultra;

        Self {
            has_subscription,
            tier: Some(profile.tier),
            status: profile.subscription_status,
            end_date: profile.subscription_end_date,
            can_use_portal,
            is_expired,
            full_name: profile.full_name.clone(),
            avatar_url: profile.avatar_url.clone(),
        }
    }

    /// Derive access info from an optional profile at the current instant
    #[must_use]
    pub fn current(profile: Option<&Profile>) -> Self {
        profile.map_or_else(Self::none, |p| Self::from_profile(p, Utc::now()))
    }
}
