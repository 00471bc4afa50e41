// ABOUTME: Subscription profile database operations
// ABOUTME: Profile reads, billing webhook mutations, and user-driven edits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{PlanTier, Profile, SubscriptionStatus};
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

impl Database {
    /// Create the profiles table
    pub(super) async fn migrate_profiles(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS profiles (
                user_id TEXT PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
                tier TEXT NOT NULL DEFAULT 'base' CHECK (tier IN ('base', 'ultra')),
                subscription_status TEXT NOT NULL DEFAULT 'inactive'
                    CHECK (subscription_status IN ('active', 'inactive', 'cancelled')),
                subscription_end_date TEXT,
                stripe_customer_id TEXT,
                stripe_subscription_id TEXT,
                is_portal_enabled BOOLEAN NOT NULL DEFAULT 0,
                full_name TEXT,
                avatar_url TEXT,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create profiles table: {e}")))?;

        Ok(())
    }

    /// Insert a profile row
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails
    pub async fn create_profile(&self, profile: &Profile) -> AppResult<()> {
        sqlx::query(
            r"
            INSERT INTO profiles (user_id, tier, subscription_status, subscription_end_date,
                                  stripe_customer_id, stripe_subscription_id, is_portal_enabled,
                                  full_name, avatar_url, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(profile.user_id.to_string())
        .bind(profile.tier.as_str())
        .bind(profile.subscription_status.as_str())
        .bind(profile.subscription_end_date.map(|t| t.to_rfc3339()))
        .bind(&profile.stripe_customer_id)
        .bind(&profile.stripe_subscription_id)
        .bind(profile.is_portal_enabled)
        .bind(&profile.full_name)
        .bind(&profile.avatar_url)
        .bind(profile.updated_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to create profile: {e}")))?;

        Ok(())
    }

    /// Get a profile by user id
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let row = sqlx::query(
            r"
            SELECT user_id, tier, subscription_status, subscription_end_date,
                   stripe_customer_id, stripe_subscription_id, is_portal_enabled,
                   full_name, avatar_url, updated_at
            FROM profiles
            WHERE user_id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;

        row.map(|r| Self::row_to_profile(&r)).transpose()
    }

    /// Update user-editable profile fields
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_profile_fields(
        &self,
        user_id: Uuid,
        full_name: Option<&str>,
        avatar_url: Option<&str>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r"
            UPDATE profiles
            SET full_name = COALESCE($1, full_name),
                avatar_url = COALESCE($2, avatar_url),
                updated_at = $3
            WHERE user_id = $4
            ",
        )
        .bind(full_name)
        .bind(avatar_url)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        Ok(result.rows_affected() > 0)
    }

    /// Record the Stripe customer id created for this user
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn set_stripe_customer(&self, user_id: Uuid, customer_id: &str) -> AppResult<()> {
        sqlx::query(
            "UPDATE profiles SET stripe_customer_id = $1, updated_at = $2 WHERE user_id = $3",
        )
        .bind(customer_id)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to set stripe customer: {e}")))?;
        Ok(())
    }

    /// Activate a purchased tier after checkout completion
    ///
    /// Stamps the renewal date from the provider's billing period end and
    /// unlocks Portal Mode for Ultra purchases.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn activate_subscription(
        &self,
        user_id: Uuid,
        tier: PlanTier,
        end_date: DateTime<Utc>,
        subscription_id: &str,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE profiles
            SET tier = $1,
                subscription_status = 'active',
                subscription_end_date = $2,
                stripe_subscription_id = $3,
                is_portal_enabled = $4,
                updated_at = $5
            WHERE user_id = $6
            ",
        )
        .bind(tier.as_str())
        .bind(end_date.to_rfc3339())
        .bind(subscription_id)
        .bind(tier == PlanTier::Ultra)
        .bind(Utc::now().to_rfc3339())
        .bind(user_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to activate subscription: {e}")))?;
        Ok(())
    }

    /// Mirror a subscription status change from the billing provider
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn update_subscription_status(
        &self,
        user_id: Uuid,
        status: SubscriptionStatus,
        end_date: Option<DateTime<Utc>>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE profiles
            SET subscription_status = $1,
                subscription_end_date = COALESCE($2, subscription_end_date),
                updated_at = $3
            WHERE user_id = $4
            ",
        )
        .bind(status.as_str())
        .bind(end_date.map(|t| t.to_rfc3339()))
        .bind(Utc::now().to_rfc3339())
        .bind(user_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to update subscription status: {e}")))?;
        Ok(())
    }

    /// Mark a subscription cancelled and revoke elevated-tier access
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails
    pub async fn cancel_subscription(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE profiles
            SET subscription_status = 'cancelled',
                is_portal_enabled = 0,
                updated_at = $1
            WHERE user_id = $2
            ",
        )
        .bind(Utc::now().to_rfc3339())
        .bind(user_id.to_string())
        .execute(self.pool())
        .await
        .map_err(|e| AppError::database(format!("Failed to cancel subscription: {e}")))?;
        Ok(())
    }

    fn row_to_profile(row: &sqlx::sqlite::SqliteRow) -> AppResult<Profile> {
        let user_id: String = row.get("user_id");
        let tier: String = row.get("tier");
        let status: String = row.get("subscription_status");
        let end_date: Option<String> = row.get("subscription_end_date");
        let updated_at: String = row.get("updated_at");

        Ok(Profile {
            user_id: Uuid::parse_str(&user_id)
                .map_err(|e| AppError::database(format!("Invalid user id in profile row: {e}")))?,
            tier: tier
                .parse()
                .map_err(|e| AppError::database(format!("Invalid tier in profile row: {e}")))?,
            subscription_status: status
                .parse()
                .map_err(|e| AppError::database(format!("Invalid status in profile row: {e}")))?,
            subscription_end_date: end_date
                .map(|value| {
                    DateTime::parse_from_rfc3339(&value)
                        .map(|t| t.with_timezone(&Utc))
                        .map_err(|e| {
                            AppError::database(format!("Invalid end date in profile row: {e}"))
                        })
                })
                .transpose()?,
            stripe_customer_id: row.get("stripe_customer_id"),
            stripe_subscription_id: row.get("stripe_subscription_id"),
            is_portal_enabled: row.get("is_portal_enabled"),
            full_name: row.get("full_name"),
            avatar_url: row.get("avatar_url"),
            updated_at: DateTime::parse_from_rfc3339(&updated_at)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| {
                    AppError::database(format!("Invalid updated_at in profile row: {e}"))
                })?,
        })
    }
}
