use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::time::{Duration, sleep};

use novabud::chat::ChatPipeline;
use novabud::error::ApiError;
use novabud::provider::{ChatProvider, SpeechProvider};
use novabud::store::{DataStore, MemBlobStore, MemStore};
use novabud::types::{Buddy, ChatTurn, Sender};

/// Routes completion calls by the system prompt: the classifier, the
/// summarizer, and the persona reply each get their own canned answer.
struct ScriptedProvider {
    mood: String,
    reply: String,
    facts_json: String,
    fail_reply: AtomicBool,
}

impl ScriptedProvider {
    fn new(mood: &str, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            mood: mood.to_string(),
            reply: reply.to_string(),
            facts_json: r#"["User has a cat"]"#.to_string(),
            fail_reply: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl ChatProvider for ScriptedProvider {
    async fn complete(&self, turns: &[ChatTurn], _temperature: f32) -> anyhow::Result<String> {
        let system = &turns[0].content;
        if system.contains("mood detector") {
            Ok(self.mood.clone())
        } else if system.contains("summarizing user behavior") {
            Ok(self.facts_json.clone())
        } else if self.fail_reply.load(Ordering::SeqCst) {
            anyhow::bail!("completion provider down")
        } else {
            Ok(self.reply.clone())
        }
    }
}

struct FailingSpeech;

#[async_trait]
impl SpeechProvider for FailingSpeech {
    async fn synthesize(&self, _text: &str) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("tts down")
    }

    async fn transcribe(&self, _audio: Vec<u8>) -> anyhow::Result<String> {
        anyhow::bail!("stt down")
    }
}

struct OkSpeech;

#[async_trait]
impl SpeechProvider for OkSpeech {
    async fn synthesize(&self, _text: &str) -> anyhow::Result<Vec<u8>> {
        Ok(vec![0u8; 16])
    }

    async fn transcribe(&self, _audio: Vec<u8>) -> anyhow::Result<String> {
        Ok("hey".to_string())
    }
}

fn test_buddy() -> Buddy {
    Buddy {
        id: "buddy-a".into(),
        user_id: "user-1".into(),
        name: "Nova".into(),
        gender: "female".into(),
        ethnicity: "latina".into(),
        hair: "curly".into(),
        style: "streetwear".into(),
        eye_color: "brown".into(),
        skin_tone: "tan".into(),
        features: None,
        personality_tags: vec!["chill".into(), "funny".into()],
        interests: vec![],
        music_genres: vec![],
        movie_genres: vec![],
        avatar_url: String::new(),
        intro_message: String::new(),
        created_at: Utc::now(),
    }
}

async fn setup(provider: Arc<ScriptedProvider>) -> (Arc<MemStore>, ChatPipeline) {
    let store = Arc::new(MemStore::new());
    store.insert_buddy(test_buddy()).await.unwrap();
    let pipeline = ChatPipeline::new(store.clone(), provider, 3);
    (store, pipeline)
}

#[tokio::test]
async fn chat_turn_persists_everything_in_order() {
    let provider = ScriptedProvider::new("Stressed", "breathe in. you got this! fr");
    let (store, pipeline) = setup(provider).await;

    let replies = pipeline
        .handle_turn("user-1", "buddy-a", "I'm stressed about exams", &[])
        .await
        .unwrap();

    assert_eq!(replies, vec!["breathe in.", "you got this!", "fr"]);

    // One mood record with the classified label.
    let moods = store.recent_moods("user-1", 5).await.unwrap();
    assert_eq!(moods.len(), 1);
    assert_eq!(moods[0].mood, novabud::mood::Mood::Stressed);

    // User message first, then one row per segment, in order.
    let history = store.chat_history("user-1", Some("buddy-a")).await.unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].sender, Sender::User);
    assert_eq!(history[0].message, "I'm stressed about exams");
    let buddy_rows: Vec<&str> = history[1..].iter().map(|m| m.message.as_str()).collect();
    assert_eq!(buddy_rows, vec!["breathe in.", "you got this!", "fr"]);

    // Segments concatenate back to the raw reply.
    assert_eq!(buddy_rows.join(" "), "breathe in. you got this! fr");
}

#[tokio::test]
async fn unknown_buddy_is_not_found_with_no_side_effects() {
    let provider = ScriptedProvider::new("Happy", "hey!");
    let (store, pipeline) = setup(provider).await;

    let err = pipeline
        .handle_turn("user-1", "missing", "hello", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    assert!(store.chat_history("user-1", None).await.unwrap().is_empty());
    assert!(store.recent_moods("user-1", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn someone_elses_buddy_is_not_found() {
    let provider = ScriptedProvider::new("Happy", "hey!");
    let (_store, pipeline) = setup(provider).await;

    let err = pipeline
        .handle_turn("user-2", "buddy-a", "hello", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn empty_message_fails_validation_before_side_effects() {
    let provider = ScriptedProvider::new("Happy", "hey!");
    let (store, pipeline) = setup(provider).await;

    let err = pipeline
        .handle_turn("user-1", "buddy-a", "   ", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(store.recent_moods("user-1", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn generation_failure_keeps_user_message_and_mood() {
    let provider = ScriptedProvider::new("Sad", "unused");
    provider.fail_reply.store(true, Ordering::SeqCst);
    let (store, pipeline) = setup(provider).await;

    let err = pipeline
        .handle_turn("user-1", "buddy-a", "rough day", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Provider(_)));

    // Mood record and the user's own message are durable; no buddy reply.
    assert_eq!(store.recent_moods("user-1", 5).await.unwrap().len(), 1);
    let history = store.chat_history("user-1", None).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].sender, Sender::User);
}

#[tokio::test]
async fn third_user_turn_triggers_background_summarization() {
    let provider = ScriptedProvider::new("Happy", "nice!");
    let (store, pipeline) = setup(provider).await;

    for message in ["hey", "got a new cat", "named her Miso"] {
        pipeline
            .handle_turn("user-1", "buddy-a", message, &[])
            .await
            .unwrap();
    }

    // The summarization job is fire-and-forget; poll for its write.
    let mut memory = None;
    for _ in 0..100 {
        memory = store.user_memory("user-1").await.unwrap();
        if memory.is_some() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }

    let memory = memory.expect("summarization should have run after the 3rd turn");
    assert_eq!(memory.facts, vec!["User has a cat".to_string()]);
}

#[tokio::test]
async fn summarization_still_fires_when_the_trigger_turn_reply_fails() {
    let provider = ScriptedProvider::new("Happy", "nice!");
    let (store, pipeline) = setup(provider.clone()).await;

    for message in ["hey", "got a new cat"] {
        pipeline
            .handle_turn("user-1", "buddy-a", message, &[])
            .await
            .unwrap();
    }

    // Third user message is durable even though its reply fails, so the
    // every-3rd-turn trigger still counts.
    provider.fail_reply.store(true, Ordering::SeqCst);
    let err = pipeline
        .handle_turn("user-1", "buddy-a", "named her Miso", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Provider(_)));

    let mut memory = None;
    for _ in 0..100 {
        memory = store.user_memory("user-1").await.unwrap();
        if memory.is_some() {
            break;
        }
        sleep(Duration::from_millis(10)).await;
    }

    let memory = memory.expect("summarization should run despite the failed reply");
    assert_eq!(memory.facts, vec!["User has a cat".to_string()]);
}

#[tokio::test]
async fn two_turns_do_not_trigger_summarization() {
    let provider = ScriptedProvider::new("Happy", "nice!");
    let (store, pipeline) = setup(provider).await;

    for message in ["hey", "what's up"] {
        pipeline
            .handle_turn("user-1", "buddy-a", message, &[])
            .await
            .unwrap();
    }

    sleep(Duration::from_millis(50)).await;
    assert!(store.user_memory("user-1").await.unwrap().is_none());
}

#[tokio::test]
async fn voice_call_uploads_audio_and_flags_rows() {
    let provider = ScriptedProvider::new("Calm", "hey you. good to hear your voice!");
    let (store, pipeline) = setup(provider).await;
    let blobs = MemBlobStore::new();

    let call = pipeline
        .handle_call("user-1", "buddy-a", "call me", &[], &OkSpeech, &blobs)
        .await
        .unwrap();

    // Whole reply, not segmented.
    assert_eq!(call.reply, "hey you. good to hear your voice!");
    let audio_url = call.audio_url.expect("audio url");
    assert!(audio_url.starts_with("mem://buddy-voices/"));
    assert!(blobs.contains(audio_url.trim_start_matches("mem://")).await);

    let history = store.chat_history("user-1", Some("buddy-a")).await.unwrap();
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|m| m.is_voice_call));
    assert_eq!(history[1].audio_url.as_deref(), Some(audio_url.as_str()));
}

#[tokio::test]
async fn voice_call_degrades_without_audio_when_tts_fails() {
    let provider = ScriptedProvider::new("Calm", "still here for you.");
    let (store, pipeline) = setup(provider).await;
    let blobs = MemBlobStore::new();

    let call = pipeline
        .handle_call("user-1", "buddy-a", "call me", &[], &FailingSpeech, &blobs)
        .await
        .unwrap();

    assert_eq!(call.reply, "still here for you.");
    assert!(call.audio_url.is_none());

    let history = store.chat_history("user-1", Some("buddy-a")).await.unwrap();
    assert_eq!(history[1].audio_url, None);
}
