//! Cache key builders.
//!
//! These fixed prefixes form the de facto schema of the distributed cache.
//! Each domain concept has exactly one builder, so keys from different
//! concepts can never collide.

/// Key for a user's subscription snapshot.
pub fn subscription(user_id: &str) -> String {
    format!("subscription:{user_id}")
}

/// Key for a user's preferences.
pub fn user_prefs(user_id: &str) -> String {
    format!("user_prefs:{user_id}")
}

/// Key for a single chat.
pub fn chat(chat_id: &str) -> String {
    format!("chat:{chat_id}")
}

/// Key for a user's chat list.
pub fn chats(user_id: &str) -> String {
    format!("chats:{user_id}")
}

/// Key for a user's contact list.
pub fn contacts(user_id: &str) -> String {
    format!("contacts:{user_id}")
}

/// Key for a user's cloned voices.
pub fn voices(user_id: &str) -> String {
    format!("voices:{user_id}")
}
