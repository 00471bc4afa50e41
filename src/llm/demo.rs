// ABOUTME: Demo assistant provider streaming a fixed template character by character
// ABOUTME: Placeholder for a real model integration; no inference happens here
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use super::{AssistantProvider, ChatMode, ChatRequest, ChatStream, StreamChunk};
use crate::constants::stream::{MAX_DELAY_MS, MIN_DELAY_MS};
use crate::errors::AppError;
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;

/// Query echoed when the request carries no usable user message
const FALLBACK_QUERY: &str = "Hello";

/// Build the canned demo response for a mode and user query
#[must_use]
pub fn demo_response(mode: ChatMode, query: &str) -> String {
    let blurb = match mode {
        ChatMode::Portal => "Using our most advanced reasoning engine to analyze your request...",
        ChatMode::Normal => {
            "Analyzing your brand request with our standard intelligence model..."
        }
    };

    format!(
        "\n\n**Léger AI [{}]**\n\nYou asked: \"{}\"\n\n{}\n\n*This is a demo interface. \
         Real AI integration with customized models is ready to be enabled.*",
        mode.display_name(),
        query,
        blurb,
    )
}

/// Demo provider that streams the canned template
///
/// Emits one character per chunk with a small random delay to simulate
/// token-by-token generation.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoProvider;

impl DemoProvider {
    /// Create a new demo provider
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AssistantProvider for DemoProvider {
    fn name(&self) -> &'static str {
        "demo"
    }

    async fn complete_stream(&self, request: &ChatRequest) -> Result<ChatStream, AppError> {
        let query = request.last_user_message().unwrap_or(FALLBACK_QUERY);
        let response = demo_response(request.mode, query);

        let stream = async_stream::stream! {
            let total = response.chars().count();
            for (index, ch) in response.chars().enumerate() {
                // ThreadRng is not Send; sample before suspending
                let delay = rand::thread_rng().gen_range(MIN_DELAY_MS..=MAX_DELAY_MS);
                tokio::time::sleep(Duration::from_millis(delay)).await;

                yield Ok(StreamChunk {
                    delta: ch.to_string(),
                    is_final: index + 1 == total,
                });
            }
        };

        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::llm::ChatMessage;
    use tokio_stream::StreamExt;

    #[test]
    fn test_demo_response_normal_mode() {
        let response = demo_response(ChatMode::Normal, "Hello");
        assert!(response.contains("You asked: \"Hello\""));
        assert!(response.contains("Normal Mode"));
        assert!(response.contains("standard intelligence model"));
    }

    #[test]
    fn test_demo_response_portal_mode() {
        let response = demo_response(ChatMode::Portal, "Analyze my brand");
        assert!(response.contains("Portal Mode"));
        assert!(response.contains("most advanced reasoning engine"));
    }

    #[tokio::test]
    async fn test_stream_reassembles_to_full_template() {
        let provider = DemoProvider::new();
        let request = ChatRequest::new(vec![ChatMessage::user("Hi")], ChatMode::Normal);

        let mut stream = provider.complete_stream(&request).await.unwrap();
        let mut assembled = String::new();
        let mut final_seen = false;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.unwrap();
            assert!(!final_seen, "chunks after the final chunk");
            assembled.push_str(&chunk.delta);
            final_seen = chunk.is_final;
        }

        assert!(final_seen);
        assert_eq!(assembled, demo_response(ChatMode::Normal, "Hi"));
    }

    #[tokio::test]
    async fn test_stream_defaults_to_hello_without_user_message() {
        let provider = DemoProvider::new();
        let request = ChatRequest::new(vec![], ChatMode::Normal);

        let mut stream = provider.complete_stream(&request).await.unwrap();
        let mut assembled = String::new();
        while let Some(chunk) = stream.next().await {
            assembled.push_str(&chunk.unwrap().delta);
        }

        assert!(assembled.contains("You asked: \"Hello\""));
    }
}
