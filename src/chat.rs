//! Conversation orchestrator: one inbound chat turn end to end.

use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::memory::MemorySummarizer;
use crate::mood::{Mood, MoodClassifier, dominant_mood, mood_instruction};
use crate::prompt::build_system_prompt;
use crate::provider::{ChatProvider, SpeechProvider};
use crate::segment::segment_reply;
use crate::store::{BlobStore, DataStore};
use crate::types::{Buddy, ChatMessage, ChatTurn, MoodRecord, Sender};

/// Mood trend window: majority over the most recent records.
const TREND_WINDOW: usize = 5;

/// Result of a voice-call turn.
pub struct CallReply {
    pub reply: String,
    pub audio_url: Option<String>,
}

pub struct ChatPipeline {
    store: Arc<dyn DataStore>,
    provider: Arc<dyn ChatProvider>,
    classifier: MoodClassifier,
    summarizer: Arc<MemorySummarizer>,
    summarize_every: u64,
}

impl ChatPipeline {
    pub fn new(
        store: Arc<dyn DataStore>,
        provider: Arc<dyn ChatProvider>,
        summarize_every: u64,
    ) -> Self {
        Self {
            classifier: MoodClassifier::new(Arc::clone(&provider)),
            summarizer: Arc::new(MemorySummarizer::new(
                Arc::clone(&store),
                Arc::clone(&provider),
            )),
            store,
            provider,
            summarize_every,
        }
    }

    pub fn summarizer(&self) -> Arc<MemorySummarizer> {
        Arc::clone(&self.summarizer)
    }

    /// Handle one text chat turn. Returns the ordered reply segments.
    pub async fn handle_turn(
        &self,
        user_id: &str,
        buddy_id: &str,
        message: &str,
        history: &[ChatTurn],
    ) -> Result<Vec<String>, ApiError> {
        let (buddy, mood) = self.prepare_turn(user_id, buddy_id, message).await?;
        let raw_reply = self
            .generate_reply(user_id, &buddy, mood, message, history, false)
            .await?;

        let segments: Vec<String> = segment_reply(&raw_reply).map(String::from).collect();
        for segment in &segments {
            self.store
                .append_chat(ChatMessage::text(user_id, buddy_id, Sender::Buddy, segment))
                .await?;
        }

        Ok(segments)
    }

    /// Handle one voice-call turn. The reply stays whole; it is voiced and
    /// the clip uploaded. Speech or upload failure degrades to a text-only
    /// reply rather than failing the call.
    pub async fn handle_call(
        &self,
        user_id: &str,
        buddy_id: &str,
        message: &str,
        history: &[ChatTurn],
        speech: &dyn SpeechProvider,
        blobs: &dyn BlobStore,
    ) -> Result<CallReply, ApiError> {
        let (buddy, mood) = self.prepare_turn(user_id, buddy_id, message).await?;
        let reply = self
            .generate_reply(user_id, &buddy, mood, message, history, true)
            .await?
            .trim()
            .to_string();

        let audio_url = match speech.synthesize(&reply).await {
            Ok(audio) => {
                let key = format!(
                    "buddy-voices/{}-{}.mp3",
                    chrono::Utc::now().timestamp_millis(),
                    uuid::Uuid::new_v4()
                );
                match blobs.put(&key, audio, "audio/mpeg").await {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!("voice clip upload failed, continuing without audio: {e:#}");
                        None
                    }
                }
            }
            Err(e) => {
                warn!("speech synthesis failed, continuing without audio: {e:#}");
                None
            }
        };

        let mut buddy_message = ChatMessage::text(user_id, buddy_id, Sender::Buddy, &reply);
        buddy_message.is_voice_call = true;
        buddy_message.audio_url = audio_url.clone();
        self.store.append_chat(buddy_message).await?;

        Ok(CallReply { reply, audio_url })
    }

    /// Shared front half of both turn kinds: validate, load the buddy,
    /// classify mood, and record the MoodRecord unconditionally.
    async fn prepare_turn(
        &self,
        user_id: &str,
        buddy_id: &str,
        message: &str,
    ) -> Result<(Buddy, Mood), ApiError> {
        if message.trim().is_empty() {
            return Err(ApiError::Validation(
                "Message, buddy ID, and user ID are required".into(),
            ));
        }

        let buddy = self
            .store
            .buddy(buddy_id)
            .await?
            .filter(|b| b.user_id == user_id)
            .ok_or_else(|| ApiError::NotFound("Buddy info not found.".into()))?;

        // Classification and its record are independent of reply outcome.
        let mood = self.classifier.classify(message).await;
        self.store
            .append_mood(MoodRecord {
                user_id: user_id.to_string(),
                mood,
                timestamp: chrono::Utc::now(),
            })
            .await?;

        let recent = self.store.recent_moods(user_id, TREND_WINDOW).await?;
        if let Some(trend) = dominant_mood(&recent) {
            // Consumed by the reminder job, not by this reply.
            debug!(user = user_id, %trend, "mood trend");
        }

        Ok((buddy, mood))
    }

    /// Back half shared by text and voice turns: persist the user message
    /// (durably, before generation — a provider failure must not lose user
    /// input), bump the turn counter, kick off summarization on every Nth
    /// user message, then call the provider.
    async fn generate_reply(
        &self,
        user_id: &str,
        buddy: &Buddy,
        mood: Mood,
        message: &str,
        history: &[ChatTurn],
        is_voice_call: bool,
    ) -> Result<String, ApiError> {
        let facts = self
            .store
            .user_memory(user_id)
            .await?
            .map(|m| m.facts)
            .unwrap_or_default();

        let system = build_system_prompt(buddy, &facts, mood, mood_instruction(mood));

        let mut turns = Vec::with_capacity(history.len() + 2);
        turns.push(ChatTurn::system(system));
        turns.extend_from_slice(history);
        turns.push(ChatTurn::user(message));

        let mut user_message = ChatMessage::text(user_id, &buddy.id, Sender::User, message);
        user_message.is_voice_call = is_voice_call;
        self.store.append_chat(user_message).await?;
        let turn_count = self.store.bump_turn_count(user_id).await?;

        // The user message is already durable, so the trigger must not
        // depend on the reply succeeding; a failed generation on a trigger
        // turn would otherwise consume it.
        if turn_count % self.summarize_every == 0 {
            let summarizer = self.summarizer();
            let user = user_id.to_string();
            tokio::spawn(async move {
                if let Err(e) = summarizer.summarize(&user).await {
                    warn!(user = %user, "background summarization failed: {e:#}");
                }
            });
        }

        let reply = self
            .provider
            .complete(&turns, 0.7)
            .await
            .map_err(ApiError::Provider)?;

        Ok(reply)
    }
}
