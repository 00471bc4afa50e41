// ABOUTME: User account model for the authentication system
// ABOUTME: User records carry credentials and identity, never subscription state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user account
///
/// Subscription state lives on the [`Profile`](super::Profile) row keyed by
/// this user's id; the two are created together at registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user `ID`
    pub id: Uuid,
    /// User email (unique)
    pub email: String,
    /// Optional display name
    pub display_name: Option<String>,
    /// Bcrypt password hash
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// Last time the user authenticated
    pub last_active: DateTime<Utc>,
}

impl User {
    /// Create a new user with a fresh id and current timestamps
    #[must_use]
    pub fn new(email: String, password_hash: String, display_name: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email,
            display_name,
            password_hash,
            created_at: now,
            last_active: now,
        }
    }
}
