//! Chat message types.

use std::borrow::Cow;
use std::fmt;

/// Role of a chat message author.
///
/// The three OpenAI roles are modelled explicitly. Anything else is kept
/// verbatim in `Other` so new roles flow through without code changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    System,
    User,
    Assistant,
    Other(String),
}

impl Role {
    /// Parse a wire role string. Never fails.
    pub fn parse(role: &str) -> Self {
        match role {
            "system" => Self::System,
            "user" => Self::User,
            "assistant" => Self::Assistant,
            other => Self::Other(other.to_string()),
        }
    }

    /// Wire representation of the role.
    pub fn as_str(&self) -> &str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Other(role) => role,
        }
    }

    /// Label used when rendering the role into a prompt line.
    ///
    /// Unknown roles are capitalized: `tool` becomes `Tool`.
    pub fn label(&self) -> Cow<'_, str> {
        match self {
            Self::System => Cow::Borrowed("System"),
            Self::User => Cow::Borrowed("User"),
            Self::Assistant => Cow::Borrowed("Assistant"),
            Self::Other(role) => capitalize(role),
        }
    }
}

impl From<&str> for Role {
    fn from(role: &str) -> Self {
        Self::parse(role)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn capitalize(word: &str) -> Cow<'_, str> {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) if !first.is_uppercase() => {
            let mut label = String::with_capacity(word.len());
            label.extend(first.to_uppercase());
            label.push_str(chars.as_str());
            Cow::Owned(label)
        }
        _ => Cow::Borrowed(word),
    }
}

/// A single role-tagged message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<Role>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
