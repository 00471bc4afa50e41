// ABOUTME: Conversation controller: transcript state, gate checks, stream consumption
// ABOUTME: Mediates between UI input, persistence, and the streaming response endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! # Conversation Controller
//!
//! The client-driven state machine behind the chat view: it owns the
//! in-memory transcript of the active session, keeps the session list
//! ordered by recency, runs the access gate before every action, and
//! consumes the streaming response endpoint chunk by chunk.

/// Controller state machine
pub mod controller;
/// Observer registration for UI cues
pub mod observer;
/// Response stream sources and incremental decoding
pub mod stream;

pub use controller::{ConversationController, SessionLoad, SubmitOutcome};
pub use observer::{ConversationObserver, Cue, ObserverId};
pub use stream::{ByteStream, HttpResponseSource, ProviderResponseSource, ResponseSource};
