// ABOUTME: Configuration management for the Léger server
// ABOUTME: Environment-only configuration, no config files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! Configuration management and persistence

/// Environment-based server configuration
pub mod environment;

pub use environment::{AppConfig, AuthConfig, DatabaseConfig, ServerConfig, StripeConfig};
