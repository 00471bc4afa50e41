// ABOUTME: Explicit observer registration for conversation events
// ABOUTME: Deterministic unsubscribe; replaces ambient audio/UI singletons
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use crate::llm::{ChatMessage, ChatMode};

/// Audible/visual cue emitted by the controller, mode-tagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    /// First message of a conversation was sent
    SendFirst,
    /// A follow-up message was sent
    SendReply,
    /// The assistant finished responding
    Receive,
    /// The response mode changed
    Transition,
}

/// Handle returned by observer registration, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObserverId(pub(crate) u64);

/// Observer of conversation events
///
/// Implementations receive cues (the original UI plays synthesized audio on
/// these), transcript updates after every streamed chunk, and user-facing
/// notices. All callbacks have empty defaults.
pub trait ConversationObserver: Send {
    /// A cue fired in the given mode
    fn on_cue(&mut self, cue: Cue, mode: ChatMode) {
        let _ = (cue, mode);
    }

    /// The visible transcript changed
    fn on_transcript_changed(&mut self, messages: &[ChatMessage]) {
        let _ = messages;
    }

    /// A user-facing notice should be shown (toast in the original UI)
    fn on_notice(&mut self, notice: &str) {
        let _ = notice;
    }
}
