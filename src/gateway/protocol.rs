//! Wire DTOs. Field names follow what the mobile client already sends
//! (`buddyId` camelCase, history as role/content pairs).

use serde::{Deserialize, Serialize};

use crate::types::{Buddy, ChatMessage, ChatTurn};

/// Body of `POST /buddy-chat` and `POST /buddy-call`. Fields are optional
/// at the serde layer so missing ones produce our 400, not a decode error.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(rename = "buddyId")]
    pub buddy_id: Option<String>,
}

impl ChatRequest {
    /// Pull out (message, buddy_id) or fail validation.
    pub fn require_fields(&self) -> Result<(&str, &str), crate::error::ApiError> {
        match (self.message.as_deref(), self.buddy_id.as_deref()) {
            (Some(message), Some(buddy_id))
                if !message.trim().is_empty() && !buddy_id.trim().is_empty() =>
            {
                Ok((message, buddy_id))
            }
            _ => Err(crate::error::ApiError::Validation(
                "Message, buddy ID, and user ID are required".into(),
            )),
        }
    }
}

/// Body of `POST /speech-to-text`: one base64-encoded audio clip.
#[derive(Debug, Deserialize)]
pub struct SpeechToTextRequest {
    pub audio: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeechToTextResponse {
    pub success: bool,
    pub transcription: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub replies: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct CallResponse {
    pub success: bool,
    pub reply: String,
    pub audio_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub success: bool,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct FactsResponse {
    pub success: bool,
    pub facts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct BuddiesResponse {
    pub success: bool,
    pub buddies: Vec<Buddy>,
}

#[derive(Debug, Serialize)]
pub struct MoodEntry {
    pub date: String,
    pub mood: String,
}

#[derive(Debug, Serialize)]
pub struct MoodHistoryResponse {
    pub success: bool,
    pub moods: Vec<MoodEntry>,
}

#[derive(Debug, Serialize)]
pub struct LastMessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct CreateBuddyResponse {
    pub success: bool,
    pub avatar_url: String,
    pub intro_message: String,
}
