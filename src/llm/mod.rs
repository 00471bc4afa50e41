// ABOUTME: Assistant provider abstraction for pluggable response generation
// ABOUTME: Defines the streaming contract the chat endpoint and controller consume
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! # Assistant Provider Service Provider Interface
//!
//! The contract a response generator must implement to back the chat
//! endpoint. The only current implementation is [`DemoProvider`], which
//! streams a fixed template; a real model integration would slot in behind
//! the same trait without touching the routes or the controller.

mod demo;

pub use demo::{demo_response, DemoProvider};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::str::FromStr;
use tokio_stream::Stream;

use crate::errors::AppError;

// ============================================================================
// Message Types
// ============================================================================

/// Role of a message in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// System instruction message
    System,
    /// User input message
    User,
    /// Assistant response message
    Assistant,
}

impl MessageRole {
    /// Convert to string representation for storage and API payloads
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl FromStr for MessageRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            _ => Err(AppError::invalid_input(format!("Invalid message role: {s}"))),
        }
    }
}

/// A single message in a chat conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
}

impl ChatMessage {
    /// Create a new chat message
    #[must_use]
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

/// Response variant requested by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    /// Standard intelligence model
    #[default]
    Normal,
    /// Advanced reasoning engine, gated behind the Ultra tier
    Portal,
}

impl ChatMode {
    /// Convert to the wire value used in the `model` request field
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Portal => "portal",
        }
    }

    /// Human-readable mode label used in responses
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Normal => "Normal Mode",
            Self::Portal => "Portal Mode",
        }
    }

    /// Parse the request's `model` field; anything but `portal` is normal
    #[must_use]
    pub fn from_model_field(model: Option<&str>) -> Self {
        match model {
            Some("portal") => Self::Portal,
            _ => Self::Normal,
        }
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Configuration for a chat completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Conversation messages
    pub messages: Vec<ChatMessage>,
    /// Requested response variant
    pub mode: ChatMode,
}

impl ChatRequest {
    /// Create a new chat request
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>, mode: ChatMode) -> Self {
        Self { messages, mode }
    }

    /// Content of the last user message, if any
    #[must_use]
    pub fn last_user_message(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
            .filter(|c| !c.is_empty())
    }
}

/// A chunk of a streaming response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChunk {
    /// Content delta for this chunk
    pub delta: String,
    /// Whether this is the final chunk
    pub is_final: bool,
}

/// Stream type for chat completion responses
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<StreamChunk, AppError>> + Send>>;

// ============================================================================
// Provider Trait
// ============================================================================

/// Assistant provider trait for chat completion
#[async_trait]
pub trait AssistantProvider: Send + Sync {
    /// Unique provider identifier (e.g. "demo")
    fn name(&self) -> &'static str;

    /// Perform a streaming chat completion
    ///
    /// Returns a stream of chunks that can be consumed incrementally.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider cannot produce a response stream
    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_model_field() {
        assert_eq!(ChatMode::from_model_field(Some("portal")), ChatMode::Portal);
        assert_eq!(ChatMode::from_model_field(Some("normal")), ChatMode::Normal);
        assert_eq!(ChatMode::from_model_field(Some("gpt-4")), ChatMode::Normal);
        assert_eq!(ChatMode::from_model_field(None), ChatMode::Normal);
    }

    #[test]
    fn test_last_user_message_skips_assistant_turns() {
        let request = ChatRequest::new(
            vec![
                ChatMessage::user("first"),
                ChatMessage::assistant("reply"),
                ChatMessage::user("second"),
                ChatMessage::assistant("another"),
            ],
            ChatMode::Normal,
        );
        assert_eq!(request.last_user_message(), Some("second"));
    }

    #[test]
    fn test_last_user_message_ignores_empty_content() {
        let request = ChatRequest::new(vec![ChatMessage::user("")], ChatMode::Normal);
        assert_eq!(request.last_user_message(), None);
    }

    #[test]
    fn test_role_round_trip() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            assert_eq!(role.as_str().parse::<MessageRole>().ok(), Some(role));
        }
        assert!("tool".parse::<MessageRole>().is_err());
    }
}
