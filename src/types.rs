use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An AI buddy persona. Created once at onboarding, immutable after that.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Buddy {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub gender: String,
    pub ethnicity: String,
    pub hair: String,
    pub style: String,
    pub eye_color: String,
    pub skin_tone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<String>,
    #[serde(default)]
    pub personality_tags: Vec<String>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub music_genres: Vec<String>,
    #[serde(default)]
    pub movie_genres: Vec<String>,
    pub avatar_url: String,
    pub intro_message: String,
    pub created_at: DateTime<Utc>,
}

/// Who wrote a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Buddy,
}

/// One transcript entry. Append-only — rows are never mutated or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub buddy_id: String,
    pub sender: Sender,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_voice_call: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

impl ChatMessage {
    /// Create a text entry with a fresh id and timestamp.
    pub fn text(user_id: &str, buddy_id: &str, sender: Sender, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            buddy_id: buddy_id.to_string(),
            sender,
            message: message.into(),
            created_at: Utc::now(),
            is_voice_call: false,
            audio_url: None,
        }
    }
}

/// One mood classification event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoodRecord {
    pub user_id: String,
    pub mood: crate::mood::Mood,
    pub timestamp: DateTime<Utc>,
}

/// Per-user fact list, fully replaced on every summarization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMemory {
    pub user_id: String,
    pub facts: Vec<String>,
    pub last_updated: DateTime<Utc>,
}

/// Role of a turn sent to the completion provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role/content pair in provider-facing conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }
}

impl Sender {
    /// Transcript sender mapped to the provider-facing role.
    pub fn as_role(self) -> Role {
        match self {
            Sender::User => Role::User,
            Sender::Buddy => Role::Assistant,
        }
    }
}
