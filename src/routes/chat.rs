// ABOUTME: Chat route handlers: the demo streaming endpoint and session CRUD
// ABOUTME: Streaming is open per the demo contract; session routes require a JWT
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! Chat routes
//!
//! `POST /api/chat` streams the demo response for any well-formed request
//! (the access gate runs client-side, in the conversation controller). The
//! session and message routes persist transcripts and require a session JWT.

use crate::{
    database::ChatManager,
    errors::AppError,
    llm::{ChatMessage, ChatMode, ChatRequest, MessageRole},
    resources::ServerResources,
};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Incoming message in a streaming request
#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    /// Message role
    pub role: String,
    /// Message content
    pub content: String,
}

/// Body of `POST /api/chat`
#[derive(Debug, Deserialize)]
pub struct StreamRequestBody {
    /// Conversation so far
    pub messages: Vec<IncomingMessage>,
    /// Response variant (`normal` | `portal`)
    #[serde(default)]
    pub model: Option<String>,
}

/// Request to create a session
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Session title; defaults to "New Chat"
    #[serde(default)]
    pub title: Option<String>,
}

/// A session in API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    /// Session id
    pub id: String,
    /// Session title
    pub title: String,
    /// Creation timestamp
    pub created_at: String,
    /// Last-touched timestamp
    pub updated_at: String,
}

/// Response for listing sessions
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionListResponse {
    /// Sessions, most recently touched first
    pub sessions: Vec<SessionSummaryResponse>,
    /// Total count
    pub total: usize,
}

/// Summary of a session for listing
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionSummaryResponse {
    /// Session id
    pub id: String,
    /// Session title
    pub title: String,
    /// Message count
    pub message_count: i64,
    /// Creation timestamp
    pub created_at: String,
    /// Last-touched timestamp
    pub updated_at: String,
}

/// Request to append a message to a session
#[derive(Debug, Deserialize)]
pub struct AppendMessageRequest {
    /// Message role (`user` | `assistant` | `system`)
    pub role: String,
    /// Message content
    pub content: String,
}

/// A message in API responses
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message id
    pub id: String,
    /// Message role
    pub role: String,
    /// Message content
    pub content: String,
    /// Creation timestamp
    pub created_at: String,
}

/// Response for a session's messages
#[derive(Debug, Serialize, Deserialize)]
pub struct MessagesListResponse {
    /// Messages in creation order
    pub messages: Vec<MessageResponse>,
}

// ============================================================================
// Chat Routes
// ============================================================================

/// Chat routes handler
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create all chat routes
    #[must_use]
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            // Demo streaming endpoint
            .route("/api/chat", post(Self::stream_response))
            // Session management
            .route(
                "/api/chat/sessions",
                post(Self::create_session).get(Self::list_sessions),
            )
            .route(
                "/api/chat/sessions/:session_id",
                axum::routing::delete(Self::delete_session),
            )
            // Messages
            .route(
                "/api/chat/sessions/:session_id/messages",
                get(Self::get_messages).post(Self::append_message),
            )
            .with_state(resources)
    }

    fn chat_manager(resources: &ServerResources) -> ChatManager {
        resources.database.chat()
    }

    // ========================================================================
    // Streaming Handler
    // ========================================================================

    /// Stream the demo response for a message history
    ///
    /// Always responds 200 with a chunked `text/plain` body; the only error
    /// path is malformed JSON input, which yields a 500 JSON error.
    async fn stream_response(
        State(resources): State<Arc<ServerResources>>,
        body: String,
    ) -> Response {
        let request: StreamRequestBody = match serde_json::from_str(&body) {
            Ok(request) => request,
            Err(e) => {
                warn!("chat request body rejected: {e}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "Error processing request"})),
                )
                    .into_response();
            }
        };

        let mode = ChatMode::from_model_field(request.model.as_deref());
        let messages: Vec<ChatMessage> = request
            .messages
            .into_iter()
            .filter_map(|m| {
                m.role
                    .parse::<MessageRole>()
                    .ok()
                    .map(|role| ChatMessage::new(role, m.content))
            })
            .collect();

        let chat_request = ChatRequest::new(messages, mode);
        let stream = match resources.provider.complete_stream(&chat_request).await {
            Ok(stream) => stream,
            Err(e) => {
                warn!("assistant provider failed: {e}");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "Error processing request"})),
                )
                    .into_response();
            }
        };

        let body_stream =
            stream.map(|chunk| chunk.map(|c| bytes::Bytes::from(c.delta)));

        let Ok(response) = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from_stream(body_stream))
        else {
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };
        response
    }

    // ========================================================================
    // Session Handlers
    // ========================================================================

    /// Create a new session
    async fn create_session(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        body: Option<Json<CreateSessionRequest>>,
    ) -> Result<Response, AppError> {
        let auth = super::authenticate(&headers, &resources)?;

        let request = body.map(|Json(r)| r).unwrap_or_default();
        let title = request.title.as_deref().unwrap_or("New Chat");

        let session = Self::chat_manager(&resources)
            .create_session(&auth.user_id.to_string(), title)
            .await?;

        let response = SessionResponse {
            id: session.id,
            title: session.title,
            created_at: session.created_at,
            updated_at: session.updated_at,
        };

        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// List the user's sessions, most recently touched first
    async fn list_sessions(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = super::authenticate(&headers, &resources)?;

        let sessions = Self::chat_manager(&resources)
            .list_sessions(&auth.user_id.to_string())
            .await?;

        let total = sessions.len();
        let response = SessionListResponse {
            sessions: sessions
                .into_iter()
                .map(|s| SessionSummaryResponse {
                    id: s.id,
                    title: s.title,
                    message_count: s.message_count,
                    created_at: s.created_at,
                    updated_at: s.updated_at,
                })
                .collect(),
            total,
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Delete a session and its messages
    async fn delete_session(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(session_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = super::authenticate(&headers, &resources)?;

        let deleted = Self::chat_manager(&resources)
            .delete_session(&session_id, &auth.user_id.to_string())
            .await?;

        if !deleted {
            return Err(AppError::not_found("Chat session"));
        }

        Ok((StatusCode::NO_CONTENT, ()).into_response())
    }

    // ========================================================================
    // Message Handlers
    // ========================================================================

    /// Get a session's messages in creation order
    async fn get_messages(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(session_id): Path<String>,
    ) -> Result<Response, AppError> {
        let auth = super::authenticate(&headers, &resources)?;
        let chat_manager = Self::chat_manager(&resources);

        // Verify the caller owns this session
        chat_manager
            .get_session(&session_id, &auth.user_id.to_string())
            .await?
            .ok_or_else(|| AppError::not_found("Chat session"))?;

        let messages = chat_manager.get_messages(&session_id).await?;

        let response = MessagesListResponse {
            messages: messages
                .into_iter()
                .map(|m| MessageResponse {
                    id: m.id,
                    role: m.role,
                    content: m.content,
                    created_at: m.created_at,
                })
                .collect(),
        };

        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Append a message to a session, touching its timestamp
    async fn append_message(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(session_id): Path<String>,
        Json(request): Json<AppendMessageRequest>,
    ) -> Result<Response, AppError> {
        let auth = super::authenticate(&headers, &resources)?;
        let role: MessageRole = request.role.parse()?;
        if request.content.trim().is_empty() {
            return Err(AppError::invalid_input("Message content must not be empty"));
        }

        let chat_manager = Self::chat_manager(&resources);
        chat_manager
            .get_session(&session_id, &auth.user_id.to_string())
            .await?
            .ok_or_else(|| AppError::not_found("Chat session"))?;

        let message = chat_manager
            .add_message(&session_id, role, &request.content)
            .await?;

        let response = MessageResponse {
            id: message.id,
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        };

        Ok((StatusCode::CREATED, Json(response)).into_response())
    }
}
