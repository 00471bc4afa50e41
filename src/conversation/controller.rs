// ABOUTME: The conversation controller state machine driving the chat view
// ABOUTME: Gate checks, session lifecycle, sequential persistence, chunked stream reads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

use super::observer::{ConversationObserver, Cue, ObserverId};
use super::stream::{ResponseSource, StreamDecoder};
use crate::constants::limits::SESSION_TITLE_MAX_CHARS;
use crate::database::{Database, MessageRecord, SessionSummary};
use crate::errors::{AppError, AppResult};
use crate::i18n::{Locale, TextKey};
use crate::llm::{ChatMessage, ChatMode, MessageRole};
use crate::models::SubscriptionInfo;
use crate::subscription::{AccessGate, AccessState, GateOutcome};
use std::sync::Arc;
use tokio_stream::StreamExt;
use uuid::Uuid;

/// Result of a `submit` call
///
/// Gate failures are routed to UI prompts rather than raised as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A previous submission is still streaming
    Busy,
    /// Input was empty or whitespace
    EmptyInput,
    /// No authenticated user; show the sign-in modal
    ShowAuth,
    /// No qualifying subscription; show the upgrade modal
    ShowUpgrade,
    /// The full response streamed and was persisted
    Completed,
    /// Streaming or persistence failed; the fallback message is visible
    Failed,
}

/// Ticket for an in-flight session load
///
/// Carries the epoch under which the load started; results applied under a
/// newer epoch are discarded, so the latest selection always wins.
#[derive(Debug, Clone)]
pub struct SessionLoad {
    /// Session being loaded
    pub session_id: String,
    epoch: u64,
}

/// Conversation controller
///
/// Owns the in-memory transcript of the active session and the ordered
/// session list, and mediates between UI input, persistence, and the
/// streaming response endpoint. All persistence calls are awaited in order,
/// so message appends are strictly sequential per conversation.
pub struct ConversationController {
    database: Arc<Database>,
    source: Arc<dyn ResponseSource>,
    locale: Locale,
    mode: ChatMode,
    user_id: Option<Uuid>,
    subscription: SubscriptionInfo,
    messages: Vec<ChatMessage>,
    sessions: Vec<SessionSummary>,
    current_session: Option<String>,
    is_loading: bool,
    load_epoch: u64,
    observers: Vec<(ObserverId, Box<dyn ConversationObserver>)>,
    next_observer: u64,
}

impl ConversationController {
    /// Create a controller over a database and response source
    #[must_use]
    pub fn new(database: Arc<Database>, source: Arc<dyn ResponseSource>) -> Self {
        Self {
            database,
            source,
            locale: Locale::default(),
            mode: ChatMode::Normal,
            user_id: None,
            subscription: SubscriptionInfo::none(),
            messages: Vec::new(),
            sessions: Vec::new(),
            current_session: None,
            is_loading: false,
            load_epoch: 0,
            observers: Vec::new(),
            next_observer: 0,
        }
    }

    // ========================================================================
    // Observers
    // ========================================================================

    /// Register an observer; returns the id needed to unregister
    pub fn register_observer(&mut self, observer: Box<dyn ConversationObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer);
        self.next_observer += 1;
        self.observers.push((id, observer));
        id
    }

    /// Unregister an observer; returns whether it was registered
    pub fn unregister_observer(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(observer_id, _)| *observer_id != id);
        self.observers.len() != before
    }

    fn notify_cue(&mut self, cue: Cue) {
        let mode = self.mode;
        for (_, observer) in &mut self.observers {
            observer.on_cue(cue, mode);
        }
    }

    fn notify_transcript(&mut self) {
        let messages = &self.messages;
        for (_, observer) in &mut self.observers {
            observer.on_transcript_changed(messages);
        }
    }

    fn notify_notice(&mut self, notice: &str) {
        for (_, observer) in &mut self.observers {
            observer.on_notice(notice);
        }
    }

    // ========================================================================
    // Identity and preferences
    // ========================================================================

    /// Bind the controller to an authenticated user
    ///
    /// Loads the subscription profile and the user's session list.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or a fetch fails
    pub async fn sign_in(&mut self, user_id: Uuid) -> AppResult<()> {
        let user = self
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User"))?;

        self.user_id = Some(user.id);
        self.refresh_subscription().await?;
        self.sessions = self
            .database
            .chat()
            .list_sessions(&user.id.to_string())
            .await?;
        Ok(())
    }

    /// Re-read the subscription profile
    ///
    /// Leaves portal mode automatically when access to it has lapsed.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile fetch fails
    pub async fn refresh_subscription(&mut self) -> AppResult<()> {
        if let Some(user_id) = self.user_id {
            let profile = self.database.get_profile(user_id).await?;
            self.subscription = SubscriptionInfo::current(profile.as_ref());
            if self.mode == ChatMode::Portal && !self.subscription.can_use_portal {
                self.mode = ChatMode::Normal;
            }
        } else {
            self.subscription = SubscriptionInfo::none();
            self.mode = ChatMode::Normal;
        }
        Ok(())
    }

    /// Tear down all per-session state on logout
    pub fn sign_out(&mut self) {
        self.user_id = None;
        self.subscription = SubscriptionInfo::none();
        self.messages.clear();
        self.sessions.clear();
        self.current_session = None;
        self.is_loading = false;
        self.mode = ChatMode::Normal;
        // Any in-flight session load becomes stale
        self.load_epoch += 1;
        self.notify_transcript();
    }

    /// Set the UI locale
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Switch the response mode, running the gate for portal mode
    ///
    /// Returns the gate outcome; the mode only changes on `Allowed`.
    pub fn set_mode(&mut self, mode: ChatMode) -> GateOutcome {
        if mode == self.mode {
            return GateOutcome::Allowed;
        }
        if mode == ChatMode::Portal {
            let outcome = AccessGate::check(self.user_id.is_some(), &self.subscription, mode);
            if outcome != GateOutcome::Allowed {
                let notice = self.locale.text(TextKey::PortalLocked).to_owned();
                self.notify_notice(&notice);
                return outcome;
            }
        }
        self.mode = mode;
        self.notify_cue(Cue::Transition);
        GateOutcome::Allowed
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// The visible transcript
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The session list, most recently touched first
    #[must_use]
    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    /// Id of the active session, if any
    #[must_use]
    pub fn current_session_id(&self) -> Option<&str> {
        self.current_session.as_deref()
    }

    /// Whether a submission or session load is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// The selected response mode
    #[must_use]
    pub const fn mode(&self) -> ChatMode {
        self.mode
    }

    /// The signed-in user, if any
    #[must_use]
    pub const fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    /// The current subscription info
    #[must_use]
    pub const fn subscription(&self) -> &SubscriptionInfo {
        &self.subscription
    }

    /// The derived access state
    #[must_use]
    pub fn access_state(&self) -> AccessState {
        AccessGate::state(self.user_id.is_some(), &self.subscription)
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Submit a query: gate checks, persistence, and streamed response
    ///
    /// # Errors
    ///
    /// Returns an error only on unexpected internal failures; gate rejections
    /// and stream failures are reported through the outcome
    pub async fn submit(&mut self, query: &str) -> AppResult<SubmitOutcome> {
        if self.is_loading {
            return Ok(SubmitOutcome::Busy);
        }
        let trimmed = query.trim();
        if trimmed.is_empty() {
            let notice = self.locale.text(TextKey::EnterMessage).to_owned();
            self.notify_notice(&notice);
            return Ok(SubmitOutcome::EmptyInput);
        }
        let Some(user_id) = self.user_id else {
            return Ok(SubmitOutcome::ShowAuth);
        };
        match AccessGate::check(true, &self.subscription, self.mode) {
            GateOutcome::Allowed => {}
            GateOutcome::ShowSignIn => return Ok(SubmitOutcome::ShowAuth),
            GateOutcome::ShowUpgrade => return Ok(SubmitOutcome::ShowUpgrade),
        }

        let cue = if self.messages.is_empty() {
            Cue::SendFirst
        } else {
            Cue::SendReply
        };
        self.notify_cue(cue);

        self.messages.push(ChatMessage::user(query));
        self.notify_transcript();
        self.is_loading = true;

        // The session is created (title from the first words of the query)
        // and the user message persisted before the response request goes
        // out. Persistence failures degrade to an unpersisted conversation
        // rather than blocking the response.
        let session_id = match self.ensure_session(user_id, trimmed).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!("failed to create chat session: {e}");
                None
            }
        };

        if let Some(ref sid) = session_id {
            match self
                .database
                .chat()
                .add_message(sid, MessageRole::User, query)
                .await
            {
                Ok(record) => self.front_session(sid, &record.created_at),
                Err(e) => tracing::warn!("failed to persist user message: {e}"),
            }
        }

        // Placeholder the stream concatenates into
        self.messages.push(ChatMessage::assistant(""));
        self.notify_transcript();

        let history: Vec<ChatMessage> = self.messages[..self.messages.len() - 1].to_vec();
        let mut stream = match self.source.fetch(&history, self.mode).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("chat request failed: {e}");
                return Ok(self.apply_stream_failure());
            }
        };

        let mut decoder = StreamDecoder::new();
        let mut streamed = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    let text = decoder.push(&bytes);
                    if !text.is_empty() {
                        streamed.push_str(&text);
                        self.set_assistant_content(&streamed);
                    }
                }
                Err(e) => {
                    tracing::warn!("chat stream failed: {e}");
                    return Ok(self.apply_stream_failure());
                }
            }
        }
        let tail = decoder.finish();
        if !tail.is_empty() {
            streamed.push_str(&tail);
            self.set_assistant_content(&streamed);
        }

        // The assistant message is persisted only once the stream is complete
        if let Some(ref sid) = session_id {
            match self
                .database
                .chat()
                .add_message(sid, MessageRole::Assistant, &streamed)
                .await
            {
                Ok(record) => self.front_session(sid, &record.created_at),
                Err(e) => {
                    tracing::warn!("failed to persist assistant message: {e}");
                    return Ok(self.apply_stream_failure());
                }
            }
        }

        self.is_loading = false;
        self.notify_cue(Cue::Receive);
        Ok(SubmitOutcome::Completed)
    }

    async fn ensure_session(&mut self, user_id: Uuid, query: &str) -> AppResult<String> {
        if let Some(id) = self.current_session.clone() {
            return Ok(id);
        }

        let title = derive_title(query);
        let record = self
            .database
            .chat()
            .create_session(&user_id.to_string(), &title)
            .await?;

        self.sessions.insert(
            0,
            SessionSummary {
                id: record.id.clone(),
                title: record.title,
                message_count: 0,
                created_at: record.created_at,
                updated_at: record.updated_at,
            },
        );
        self.current_session = Some(record.id.clone());
        Ok(record.id)
    }

    fn front_session(&mut self, session_id: &str, updated_at: &str) {
        if let Some(position) = self.sessions.iter().position(|s| s.id == session_id) {
            let mut session = self.sessions.remove(position);
            session.updated_at = updated_at.to_owned();
            session.message_count += 1;
            self.sessions.insert(0, session);
        }
    }

    fn set_assistant_content(&mut self, content: &str) {
        if let Some(last) = self.messages.last_mut() {
            if last.role == MessageRole::Assistant {
                last.content = content.to_owned();
            }
        }
        self.notify_transcript();
    }

    /// The user message already persisted stays persisted; only the visible
    /// transcript gains the fallback text.
    fn apply_stream_failure(&mut self) -> SubmitOutcome {
        let fallback = self.locale.text(TextKey::StreamError);
        match self.messages.last_mut() {
            Some(last) if last.role == MessageRole::Assistant && last.content.is_empty() => {
                last.content = fallback.to_owned();
            }
            _ => self.messages.push(ChatMessage::assistant(fallback)),
        }
        self.is_loading = false;
        self.notify_transcript();
        SubmitOutcome::Failed
    }

    // ========================================================================
    // Session lifecycle
    // ========================================================================

    /// Create a new empty session and make it active
    ///
    /// # Errors
    ///
    /// Returns an error if the user is signed out or creation fails
    pub async fn new_session(&mut self, title: Option<&str>) -> AppResult<String> {
        let Some(user_id) = self.user_id else {
            return Err(AppError::auth_required());
        };

        let title = title.unwrap_or_else(|| self.locale.text(TextKey::NewChat));
        let record = match self
            .database
            .chat()
            .create_session(&user_id.to_string(), title)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                let notice = self.locale.text(TextKey::ChatCreateFailed).to_owned();
                self.notify_notice(&notice);
                return Err(e);
            }
        };

        self.sessions.insert(
            0,
            SessionSummary {
                id: record.id.clone(),
                title: record.title,
                message_count: 0,
                created_at: record.created_at,
                updated_at: record.updated_at,
            },
        );
        self.current_session = Some(record.id.clone());
        self.messages.clear();
        self.notify_transcript();
        let notice = self.locale.text(TextKey::ChatCreated).to_owned();
        self.notify_notice(&notice);
        Ok(record.id)
    }

    /// Start loading another session's transcript
    ///
    /// Clears the visible transcript and disables interaction until the
    /// matching [`complete_session_load`](Self::complete_session_load).
    pub fn begin_session_load(&mut self, session_id: &str) -> SessionLoad {
        self.load_epoch += 1;
        self.current_session = Some(session_id.to_owned());
        self.messages.clear();
        self.is_loading = true;
        self.notify_transcript();
        SessionLoad {
            session_id: session_id.to_owned(),
            epoch: self.load_epoch,
        }
    }

    /// Apply the result of a session load
    ///
    /// A result arriving under a stale epoch is discarded: the later
    /// selection wins and transcripts never merge. Returns whether the
    /// result was applied.
    pub fn complete_session_load(
        &mut self,
        load: &SessionLoad,
        result: AppResult<Vec<MessageRecord>>,
    ) -> bool {
        if load.epoch != self.load_epoch {
            return false;
        }
        self.is_loading = false;

        match result {
            Ok(records) => {
                self.messages = records
                    .into_iter()
                    .filter_map(|record| {
                        record
                            .role
                            .parse::<MessageRole>()
                            .ok()
                            .map(|role| ChatMessage::new(role, record.content))
                    })
                    .collect();
                self.notify_transcript();
                true
            }
            Err(e) => {
                tracing::warn!("failed to load session messages: {e}");
                let notice = self.locale.text(TextKey::LoadFailed).to_owned();
                self.notify_notice(&notice);
                false
            }
        }
    }

    /// Switch to another session, fetching its messages in creation order
    ///
    /// # Errors
    ///
    /// Returns an error only if the controller has no signed-in user
    pub async fn select_session(&mut self, session_id: &str) -> AppResult<bool> {
        if self.user_id.is_none() {
            return Err(AppError::auth_required());
        }
        if self.is_loading {
            return Ok(false);
        }

        let load = self.begin_session_load(session_id);
        let result = self.database.chat().get_messages(session_id).await;
        Ok(self.complete_session_load(&load, result))
    }

    /// Delete a session from persistence and the local list
    ///
    /// Deleting the active session clears the visible transcript; deleting
    /// any other session leaves it untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the user is signed out or the delete fails
    pub async fn delete_session(&mut self, session_id: &str) -> AppResult<bool> {
        let Some(user_id) = self.user_id else {
            return Err(AppError::auth_required());
        };

        let removed = match self
            .database
            .chat()
            .delete_session(session_id, &user_id.to_string())
            .await
        {
            Ok(removed) => removed,
            Err(e) => {
                let notice = self.locale.text(TextKey::DeleteFailed).to_owned();
                self.notify_notice(&notice);
                return Err(e);
            }
        };

        if removed {
            self.sessions.retain(|s| s.id != session_id);
            if self.current_session.as_deref() == Some(session_id) {
                self.current_session = None;
                self.messages.clear();
                self.notify_transcript();
            }
            let notice = self.locale.text(TextKey::Deleted).to_owned();
            self.notify_notice(&notice);
        }
        Ok(removed)
    }
}

fn derive_title(query: &str) -> String {
    let mut title: String = query.chars().take(SESSION_TITLE_MAX_CHARS).collect();
    if query.chars().count() > SESSION_TITLE_MAX_CHARS {
        title.push_str("...");
    }
    title
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_title_short_query_unchanged() {
        assert_eq!(derive_title("Hello"), "Hello");
    }

    #[test]
    fn test_derive_title_truncates_with_ellipsis() {
        let query = "a".repeat(45);
        let title = derive_title(&query);
        assert_eq!(title.chars().count(), SESSION_TITLE_MAX_CHARS + 3);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn test_derive_title_counts_chars_not_bytes() {
        let query = "é".repeat(SESSION_TITLE_MAX_CHARS);
        assert_eq!(derive_title(&query), query);
    }
}
