// ABOUTME: Typed localization catalog for user-facing strings
// ABOUTME: Exhaustive (Locale, TextKey) match makes a missing translation a compile error
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Léger AI

//! # Localization Catalog
//!
//! The strings the conversation controller and routes surface to users, as a
//! typed mapping. Every locale must define every key; the compiler enforces
//! completeness through the exhaustive match in [`text`].

use serde::{Deserialize, Serialize};

/// Supported locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    /// English
    #[default]
    En,
    /// Russian
    Ru,
    /// Chinese
    Zh,
}

impl Locale {
    /// All supported locales
    pub const ALL: [Self; 3] = [Self::En, Self::Ru, Self::Zh];
}

/// Keys for user-facing strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextKey {
    /// Default title for a session created without a first query
    NewChat,
    /// Fallback assistant message when streaming fails
    StreamError,
    /// Inline notice for empty input
    EnterMessage,
    /// Notice after creating a session
    ChatCreated,
    /// Notice when session creation fails
    ChatCreateFailed,
    /// Notice when loading a session's messages fails
    LoadFailed,
    /// Notice when deleting a session fails
    DeleteFailed,
    /// Notice after deleting a session
    Deleted,
    /// Notice that Portal Mode requires the Ultra tier
    PortalLocked,
}

impl TextKey {
    /// All catalog keys, for parity checks in tests
    pub const ALL: [Self; 9] = [
        Self::NewChat,
        Self::StreamError,
        Self::EnterMessage,
        Self::ChatCreated,
        Self::ChatCreateFailed,
        Self::LoadFailed,
        Self::DeleteFailed,
        Self::Deleted,
        Self::PortalLocked,
    ];
}

/// Look up a localized string
#[must_use]
pub const fn text(locale: Locale, key: TextKey) -> &'static str {
    match (locale, key) {
        (Locale::En, TextKey::NewChat) => "New Chat",
        (Locale::En, TextKey::StreamError) => "I'm sorry, I encountered an error.",
        (Locale::En, TextKey::EnterMessage) => "Please enter a message.",
        (Locale::En, TextKey::ChatCreated) => "New chat created!",
        (Locale::En, TextKey::ChatCreateFailed) => "Failed to create new chat.",
        (Locale::En, TextKey::LoadFailed) => "Failed to load chat conversation.",
        (Locale::En, TextKey::DeleteFailed) => "Failed to delete chat.",
        (Locale::En, TextKey::Deleted) => "Chat deleted.",
        (Locale::En, TextKey::PortalLocked) => "Portal Mode requires Ultra subscription",

        (Locale::Ru, TextKey::NewChat) => "Новый чат",
        (Locale::Ru, TextKey::StreamError) => "Извините, произошла ошибка.",
        (Locale::Ru, TextKey::EnterMessage) => "Пожалуйста, введите сообщение.",
        (Locale::Ru, TextKey::ChatCreated) => "Новый чат создан!",
        (Locale::Ru, TextKey::ChatCreateFailed) => "Не удалось создать новый чат.",
        (Locale::Ru, TextKey::LoadFailed) => "Не удалось загрузить переписку.",
        (Locale::Ru, TextKey::DeleteFailed) => "Не удалось удалить чат.",
        (Locale::Ru, TextKey::Deleted) => "Чат удален.",
        (Locale::Ru, TextKey::PortalLocked) => "Режим Портала требует подписку Ultra",

        (Locale::Zh, TextKey::NewChat) => "新建聊天",
        (Locale::Zh, TextKey::StreamError) => "抱歉，我遇到了错误。",
        (Locale::Zh, TextKey::EnterMessage) => "请输入消息。",
        (Locale::Zh, TextKey::ChatCreated) => "新聊天已创建！",
        (Locale::Zh, TextKey::ChatCreateFailed) => "创建新聊天失败。",
        (Locale::Zh, TextKey::LoadFailed) => "加载聊天对话失败。",
        (Locale::Zh, TextKey::DeleteFailed) => "删除聊天失败。",
        (Locale::Zh, TextKey::Deleted) => "聊天已删除。",
        (Locale::Zh, TextKey::PortalLocked) => "传送门模式需要Ultra订阅",
    }
}

impl Locale {
    /// Look up a localized string for this locale
    #[must_use]
    pub const fn text(self, key: TextKey) -> &'static str {
        text(self, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_locale_defines_every_key() {
        for locale in Locale::ALL {
            for key in TextKey::ALL {
                assert!(!text(locale, key).is_empty());
            }
        }
    }

    #[test]
    fn test_known_translations() {
        assert_eq!(
            text(Locale::En, TextKey::StreamError),
            "I'm sorry, I encountered an error."
        );
        assert_eq!(text(Locale::Ru, TextKey::NewChat), "Новый чат");
        assert_eq!(text(Locale::Zh, TextKey::Deleted), "聊天已删除。");
    }
}
