// ABOUTME: Response stream sources for the conversation controller
// ABOUTME: Byte-level seam plus an incremental UTF-8 decoder for chunked reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use crate::errors::{AppError, AppResult};
use crate::llm::{AssistantProvider, ChatMessage, ChatMode, ChatRequest};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::Stream;

/// Byte stream as consumed from the response body
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, AppError>> + Send>>;

/// Source of streamed assistant responses
///
/// The controller reads raw bytes, exactly as a browser reads the fetch
/// body; where those bytes come from is this seam's concern.
#[async_trait]
pub trait ResponseSource: Send + Sync {
    /// Request a response stream for a message history and mode
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be initiated
    async fn fetch(&self, messages: &[ChatMessage], mode: ChatMode) -> AppResult<ByteStream>;
}

/// Response source hitting a remote `/api/chat` endpoint over HTTP
#[derive(Debug, Clone)]
pub struct HttpResponseSource {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpResponseSource {
    /// Create a source for the given endpoint URL
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ResponseSource for HttpResponseSource {
    async fn fetch(&self, messages: &[ChatMessage], mode: ChatMode) -> AppResult<ByteStream> {
        let body = serde_json::json!({
            "messages": messages,
            "model": mode.as_str(),
        });

        let response = self
            .http
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::external_service("chat endpoint", e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::external_service(
                "chat endpoint",
                format!("request failed with status {}", response.status()),
            ));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| AppError::external_service("chat endpoint", e.to_string())));

        Ok(Box::pin(stream))
    }
}

/// Response source driving an in-process assistant provider
///
/// Produces the same byte stream the HTTP endpoint would, without a server.
#[derive(Clone)]
pub struct ProviderResponseSource {
    provider: Arc<dyn AssistantProvider>,
}

impl ProviderResponseSource {
    /// Create a source over the given provider
    #[must_use]
    pub fn new(provider: Arc<dyn AssistantProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ResponseSource for ProviderResponseSource {
    async fn fetch(&self, messages: &[ChatMessage], mode: ChatMode) -> AppResult<ByteStream> {
        let request = ChatRequest::new(messages.to_vec(), mode);
        let chunks = self.provider.complete_stream(&request).await?;
        let stream = chunks.map(|chunk| chunk.map(|c| Bytes::from(c.delta)));
        Ok(Box::pin(stream))
    }
}

/// Incremental UTF-8 decoder for chunked byte streams
///
/// Transport chunks can split multi-byte characters; the decoder buffers the
/// incomplete tail and emits only complete characters, matching
/// `TextDecoder` stream semantics.
#[derive(Debug, Default)]
pub struct StreamDecoder {
    pending: Vec<u8>,
}

impl StreamDecoder {
    /// Create an empty decoder
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: Vec::new(),
        }
    }

    /// Feed a chunk, returning the text decodable so far
    pub fn push(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);

        let mut out = String::new();
        loop {
            match std::str::from_utf8(&self.pending) {
                Ok(text) => {
                    out.push_str(text);
                    self.pending.clear();
                    break;
                }
                Err(e) => {
                    let valid = e.valid_up_to();
                    out.push_str(&String::from_utf8_lossy(&self.pending[..valid]));

                    if let Some(len) = e.error_len() {
                        // Invalid sequence: replace it and keep decoding
                        self.pending.drain(..valid + len);
                        out.push('\u{FFFD}');
                    } else {
                        // Incomplete tail stays buffered for the next chunk
                        self.pending.drain(..valid);
                        break;
                    }
                }
            }
        }
        out
    }

    /// Flush any buffered incomplete tail as a replacement character
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            "\u{FFFD}".to_owned()
        }
    }
}
