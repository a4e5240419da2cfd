//! Memory summarization: condenses the full chat transcript into a compact
//! fact list reused by every future persona prompt.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;

use crate::error::ApiError;
use crate::provider::ChatProvider;
use crate::store::DataStore;
use crate::types::{ChatTurn, UserMemory};

const EXTRACTION_PROMPT: &str = "\
You are an expert assistant specialized in summarizing user behavior and preferences for memory storage.

Instructions:
- Only extract clear factual statements about the user from the conversation history.
- Focus on important facts such as user's preferences, habits, personal information (e.g., pets, hobbies, birthdays, job, family, location hints).
- Ignore all assistant replies, greetings, jokes, questions, and generic chatter.
- Avoid including assumptions or guesses.
- Be extremely concise. Each fact must be a short, independent sentence, no longer than 15 words.
- Output only a JSON array of strings. No introduction, no explanation, no extra text.

Example Output:
[
  \"User owns a golden retriever named Max.\",
  \"User's favorite color is blue.\",
  \"User lives in New York City.\",
  \"User enjoys hiking during weekends.\"
]";

/// Reduces a user's entire transcript (across all their buddies — facts are
/// about the user, not one persona) into a fresh fact list and overwrites
/// the UserMemory row.
pub struct MemorySummarizer {
    store: Arc<dyn DataStore>,
    provider: Arc<dyn ChatProvider>,
}

impl MemorySummarizer {
    pub fn new(store: Arc<dyn DataStore>, provider: Arc<dyn ChatProvider>) -> Self {
        Self { store, provider }
    }

    /// Run one summarization pass. The provider must emit a bare JSON array
    /// of strings; anything else fails closed with `Parse` and leaves the
    /// previous facts untouched. An empty array is a valid result and still
    /// refreshes `last_updated`.
    pub async fn summarize(&self, user_id: &str) -> Result<Vec<String>, ApiError> {
        let transcript = self.store.chat_history(user_id, None).await?;

        let mut turns = Vec::with_capacity(transcript.len() + 1);
        turns.push(ChatTurn::system(EXTRACTION_PROMPT));
        turns.extend(
            transcript
                .iter()
                .map(|m| ChatTurn::new(m.sender.as_role(), m.message.clone())),
        );

        let raw = self
            .provider
            .complete(&turns, 0.2)
            .await
            .map_err(ApiError::Provider)?;

        let facts: Vec<String> = serde_json::from_str(raw.trim())
            .map_err(|e| ApiError::Parse(format!("expected a JSON array of facts: {e}")))?;

        self.store
            .upsert_user_memory(UserMemory {
                user_id: user_id.to_string(),
                facts: facts.clone(),
                last_updated: Utc::now(),
            })
            .await?;

        info!(user = user_id, facts = facts.len(), "user memory refreshed");
        Ok(facts)
    }
}
