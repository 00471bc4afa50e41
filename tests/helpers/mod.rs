// ABOUTME: Test helper modules shared across integration tests
// ABOUTME: Axum request driver for testing routers without a running server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

/// HTTP request helpers for driving Axum routers in tests
pub mod axum_test;
