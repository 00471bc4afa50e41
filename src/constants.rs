// ABOUTME: Application constants shared across modules
// ABOUTME: Service identifiers, limits, and demo streaming parameters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! Application constants and configuration values.

/// Service identifiers used in logging and token audiences
pub mod service_names {
    /// Service name for structured logging
    pub const LEGER_SERVER: &str = "leger-server";
    /// Audience claim stamped into session JWTs
    pub const WEB_AUDIENCE: &str = "leger-web";
}

/// Limits applied to user-facing inputs
pub mod limits {
    /// Characters of the first query used to derive a session title
    pub const SESSION_TITLE_MAX_CHARS: usize = 30;
    /// Default JWT session lifetime in hours
    pub const DEFAULT_SESSION_HOURS: i64 = 24;
    /// Minimum accepted password length at registration
    pub const MIN_PASSWORD_LENGTH: usize = 8;
}

/// Demo streaming behavior
pub mod stream {
    /// Lower bound of the per-character delay in milliseconds
    pub const MIN_DELAY_MS: u64 = 5;
    /// Upper bound of the per-character delay in milliseconds
    pub const MAX_DELAY_MS: u64 = 10;
}

/// Webhook verification parameters
pub mod webhook {
    /// Maximum accepted age of a signed event timestamp, in seconds
    pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;
}
