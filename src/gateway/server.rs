use axum::extract::{Extension, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router, middleware};
use base64::Engine;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::auth::{self, AuthedUser, RemoteVerifier, SharedSecretVerifier, TokenVerifier};
use super::protocol::*;
use crate::buddy::{self, CreateBuddyRequest};
use crate::chat::ChatPipeline;
use crate::config::NovabudConfig;
use crate::error::ApiError;
use crate::provider::{ChatProvider, ImageProvider, SpeechProvider};
use crate::store::{BlobStore, DataStore, HttpBlobStore, MemBlobStore, MemStore};

pub struct AppState {
    pub store: Arc<dyn DataStore>,
    pub provider: Arc<dyn ChatProvider>,
    pub images: Arc<dyn ImageProvider>,
    pub speech: Arc<dyn SpeechProvider>,
    pub blobs: Arc<dyn BlobStore>,
    pub verifier: Arc<dyn TokenVerifier>,
    pub pipeline: ChatPipeline,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DataStore>,
        provider: Arc<dyn ChatProvider>,
        images: Arc<dyn ImageProvider>,
        speech: Arc<dyn SpeechProvider>,
        blobs: Arc<dyn BlobStore>,
        verifier: Arc<dyn TokenVerifier>,
        summarize_every: u64,
    ) -> Self {
        Self {
            pipeline: ChatPipeline::new(Arc::clone(&store), Arc::clone(&provider), summarize_every),
            store,
            provider,
            images,
            speech,
            blobs,
            verifier,
        }
    }
}

/// Start the server with providers built from config. Blocks until the
/// listener dies.
pub async fn run(config: NovabudConfig, token: Option<String>) -> anyhow::Result<()> {
    let verifier: Arc<dyn TokenVerifier> = match (&token, &config.auth.verify_url) {
        (Some(secret), _) => Arc::new(SharedSecretVerifier::new(secret.clone(), "local")),
        (None, Some(url)) => Arc::new(RemoteVerifier::new(url)),
        (None, None) => anyhow::bail!(
            "No auth configured. Set auth.verify_url in config or pass --token / NOVABUD_TOKEN."
        ),
    };

    let openai = Arc::new(crate::provider::from_config(&config)?);
    let provider: Arc<dyn ChatProvider> = openai.clone();
    let images: Arc<dyn ImageProvider> = openai;

    let speech: Arc<dyn SpeechProvider> = match crate::provider::speech_from_config(&config) {
        Ok(p) => Arc::new(p),
        Err(e) => {
            // Calls still work without audio; synthesis just degrades.
            warn!("speech provider unavailable: {e:#}");
            Arc::new(DisabledSpeech)
        }
    };

    let blobs: Arc<dyn BlobStore> = match &config.storage.base_url {
        Some(url) => Arc::new(HttpBlobStore::new(url, config.storage.access_token.clone())),
        None => {
            warn!("no blob store configured, generated assets are kept in memory");
            Arc::new(MemBlobStore::new())
        }
    };

    let store: Arc<dyn DataStore> = Arc::new(MemStore::new());

    let state = Arc::new(AppState::new(
        store,
        provider,
        images,
        speech,
        blobs,
        verifier,
        config.memory.summarize_every,
    ));

    crate::jobs::spawn(
        Arc::clone(&state.store),
        Arc::clone(&state.provider),
        &config.jobs,
    );

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("novabud backend listening on {addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Assemble the route table. Split out so tests can serve it with mock
/// providers.
pub fn router(state: Arc<AppState>) -> Router {
    let authed = Router::new()
        .route("/buddy-chat/history/{buddy_id}", get(chat_history))
        .route("/buddy-chat/history", get(chat_history_all))
        .route("/buddy-chat", post(buddy_chat))
        .route("/buddy-call", post(buddy_call))
        .route("/speech-to-text", post(speech_to_text))
        .route("/summarize-memory", post(summarize_memory))
        .route("/home/buddy-info", get(buddy_info))
        .route("/home/user-memory", get(user_memory))
        .route("/home/mood-history", get(mood_history))
        .route("/home/buddy-last-message", get(buddy_last_message))
        .route("/create-buddy", post(create_buddy))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            auth::require_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(authed)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn chat_history(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Path(buddy_id): Path<String>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state.store.chat_history(&user_id, Some(&buddy_id)).await?;
    Ok(Json(HistoryResponse {
        success: true,
        messages,
    }))
}

async fn chat_history_all(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let messages = state.store.chat_history(&user_id, None).await?;
    Ok(Json(HistoryResponse {
        success: true,
        messages,
    }))
}

async fn buddy_chat(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (message, buddy_id) = req.require_fields()?;
    let replies = state
        .pipeline
        .handle_turn(&user_id, buddy_id, message, &req.history)
        .await?;
    Ok(Json(ChatResponse {
        success: true,
        replies,
    }))
}

async fn buddy_call(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<CallResponse>, ApiError> {
    let (message, buddy_id) = req.require_fields()?;
    let call = state
        .pipeline
        .handle_call(
            &user_id,
            buddy_id,
            message,
            &req.history,
            state.speech.as_ref(),
            state.blobs.as_ref(),
        )
        .await?;
    Ok(Json(CallResponse {
        success: true,
        reply: call.reply,
        audio_url: call.audio_url,
    }))
}

async fn speech_to_text(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(_user_id)): Extension<AuthedUser>,
    Json(req): Json<SpeechToTextRequest>,
) -> Result<Json<SpeechToTextResponse>, ApiError> {
    let audio = req
        .audio
        .as_deref()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::Validation("Audio is required".into()))?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(audio)
        .map_err(|_| ApiError::Validation("Audio must be base64-encoded".into()))?;

    let transcription = state
        .speech
        .transcribe(bytes)
        .await
        .map_err(ApiError::Provider)?;
    Ok(Json(SpeechToTextResponse {
        success: true,
        transcription,
    }))
}

async fn summarize_memory(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<FactsResponse>, ApiError> {
    let facts = state.pipeline.summarizer().summarize(&user_id).await?;
    Ok(Json(FactsResponse {
        success: true,
        facts,
    }))
}

async fn buddy_info(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<BuddiesResponse>, ApiError> {
    let buddies = state.store.buddies_for_user(&user_id).await?;
    Ok(Json(BuddiesResponse {
        success: true,
        buddies,
    }))
}

async fn user_memory(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<FactsResponse>, ApiError> {
    let facts = state
        .store
        .user_memory(&user_id)
        .await?
        .map(|m| m.facts)
        .unwrap_or_default();
    Ok(Json(FactsResponse {
        success: true,
        facts,
    }))
}

async fn mood_history(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<MoodHistoryResponse>, ApiError> {
    let moods = state
        .store
        .mood_history(&user_id)
        .await?
        .into_iter()
        .map(|r| MoodEntry {
            date: r.timestamp.format("%Y-%m-%d").to_string(),
            mood: r.mood.to_string(),
        })
        .collect();
    Ok(Json(MoodHistoryResponse {
        success: true,
        moods,
    }))
}

async fn buddy_last_message(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
) -> Result<Json<LastMessageResponse>, ApiError> {
    let message = state
        .store
        .last_buddy_message(&user_id)
        .await?
        .map(|m| m.message)
        .unwrap_or_default();
    Ok(Json(LastMessageResponse {
        success: true,
        message,
    }))
}

async fn create_buddy(
    State(state): State<Arc<AppState>>,
    Extension(AuthedUser(user_id)): Extension<AuthedUser>,
    Json(body): Json<serde_json::Value>,
) -> Result<Json<CreateBuddyResponse>, ApiError> {
    // Missing persona fields are a 400, not a decode error.
    let req: CreateBuddyRequest = serde_json::from_value(body)
        .map_err(|_| ApiError::Validation("Missing required fields.".into()))?;
    let created = buddy::create_buddy(
        state.store.as_ref(),
        state.provider.as_ref(),
        state.images.as_ref(),
        state.blobs.as_ref(),
        &user_id,
        req,
    )
    .await?;
    Ok(Json(CreateBuddyResponse {
        success: true,
        avatar_url: created.avatar_url,
        intro_message: created.intro_message,
    }))
}

/// Stands in when no speech API key is configured; calls degrade to
/// text-only replies and transcription requests fail.
struct DisabledSpeech;

#[async_trait::async_trait]
impl SpeechProvider for DisabledSpeech {
    async fn synthesize(&self, _text: &str) -> anyhow::Result<Vec<u8>> {
        anyhow::bail!("no speech API key configured")
    }

    async fn transcribe(&self, _audio: Vec<u8>) -> anyhow::Result<String> {
        anyhow::bail!("no speech API key configured")
    }
}
