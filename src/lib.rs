// ABOUTME: Main library entry point for the Léger AI web backend
// ABOUTME: Auth, subscriptions, chat persistence, and the demo streaming endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

#![deny(unsafe_code)]

//! # Léger Server
//!
//! The web backend behind the Léger AI brand-intelligence product:
//!
//! - **Auth**: email/password accounts with HS256 session JWTs
//! - **Subscriptions**: Stripe checkout and webhook-driven profile state,
//!   gating chat access (Base) and Portal Mode (Ultra)
//! - **Chat**: persisted sessions and messages, plus the demo streaming
//!   endpoint that emits a canned response character by character
//! - **Conversation controller**: the client-side state machine driving
//!   transcripts, session switching, and stream consumption
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use leger_server::config::ServerConfig;
//! use leger_server::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Léger server configured: {}", config.summary());
//!     Ok(())
//! }
//! ```

/// Authentication and session token management
pub mod auth;

/// Stripe billing client and webhook verification
pub mod billing;

/// Configuration management
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// The conversation controller and stream consumption
pub mod conversation;

/// Database management for users, profiles, and chat transcripts
pub mod database;

/// Unified error handling system
pub mod errors;

/// Typed localization catalog
pub mod i18n;

/// Assistant provider abstraction and the demo provider
pub mod llm;

/// Structured logging configuration
pub mod logging;

/// Domain models
pub mod models;

/// Centralized resource container for dependency injection
pub mod resources;

/// HTTP routes
pub mod routes;

/// Access-gate checks over authentication and subscription state
pub mod subscription;
