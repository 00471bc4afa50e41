// ABOUTME: Integration tests for the demo streaming endpoint
// ABOUTME: Covers the response contract, mode handling, and malformed input
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

#![allow(clippy::unwrap_used, clippy::expect_used)]
#![allow(missing_docs)]

mod common;
mod helpers;

use common::create_test_resources;
use helpers::axum_test::AxumTestRequest;
use leger_server::routes::chat::ChatRoutes;

use axum::http::StatusCode;
use serde_json::json;

async fn chat_router() -> axum::Router {
    ChatRoutes::routes(create_test_resources().await)
}

#[tokio::test]
async fn test_stream_normal_mode_echoes_query() {
    let router = chat_router().await;

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "Hello"}],
            "model": "normal"
        }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(
        response.header("content-type"),
        Some("text/plain; charset=utf-8")
    );
    assert_eq!(response.header("cache-control"), Some("no-cache"));

    let body = response.text();
    assert!(body.contains("You asked: \"Hello\""));
    assert!(body.contains("Normal Mode"));
    assert!(body.contains("This is a demo interface"));
}

#[tokio::test]
async fn test_stream_portal_mode_uses_portal_blurb() {
    let router = chat_router().await;

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "Audit my brand"}],
            "model": "portal"
        }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body = response.text();
    assert!(body.contains("Portal Mode"));
    assert!(body.contains("most advanced reasoning engine"));
    assert!(body.contains("You asked: \"Audit my brand\""));
}

#[tokio::test]
async fn test_stream_unknown_model_falls_back_to_normal() {
    let router = chat_router().await;

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [{"role": "user", "content": "hi"}],
            "model": "gpt-4"
        }))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Normal Mode"));
}

#[tokio::test]
async fn test_stream_echoes_last_user_message() {
    let router = chat_router().await;

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({
            "messages": [
                {"role": "user", "content": "first question"},
                {"role": "assistant", "content": "an answer"},
                {"role": "user", "content": "second question"}
            ],
            "model": "normal"
        }))
        .send(router)
        .await;

    let body = response.text();
    assert!(body.contains("You asked: \"second question\""));
    assert!(!body.contains("first question"));
}

#[tokio::test]
async fn test_stream_empty_history_defaults_to_hello() {
    let router = chat_router().await;

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({"messages": [], "model": "normal"}))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("You asked: \"Hello\""));
}

#[tokio::test]
async fn test_malformed_json_returns_500_error_body() {
    let router = chat_router().await;

    let response = AxumTestRequest::post("/api/chat")
        .raw_body("{not json at all")
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Error processing request");
}

#[tokio::test]
async fn test_missing_messages_field_is_malformed() {
    let router = chat_router().await;

    let response = AxumTestRequest::post("/api/chat")
        .json(&json!({"model": "normal"}))
        .send(router)
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
}
