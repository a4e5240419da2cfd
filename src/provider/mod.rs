//! External AI provider interfaces. Everything the pipeline needs from the
//! outside world goes through these traits so it can be mocked in tests.

pub mod elevenlabs;
pub mod openai;

use async_trait::async_trait;

use crate::config::NovabudConfig;
use crate::types::ChatTurn;

pub use elevenlabs::ElevenLabsProvider;
pub use openai::OpenAiProvider;

/// Chat completion provider.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the full turn list (system prompt first) and return the raw
    /// assistant reply text.
    async fn complete(&self, turns: &[ChatTurn], temperature: f32) -> anyhow::Result<String>;
}

/// Image generation provider. Returns raw image bytes.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<Vec<u8>>;
}

/// Speech provider: text-to-speech and speech-to-text.
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Voice `text` and return encoded audio bytes.
    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>>;
    /// Transcribe recorded audio to text.
    async fn transcribe(&self, audio: Vec<u8>) -> anyhow::Result<String>;
}

/// Build the chat/image provider from config. Fails fast when no API key is
/// available rather than at the first live request.
pub fn from_config(config: &NovabudConfig) -> anyhow::Result<OpenAiProvider> {
    let api_key = config
        .provider
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no completion API key. Set OPENAI_API_KEY env var."))?;

    OpenAiProvider::new(
        &config.provider.base_url,
        api_key,
        config.provider.chat_model.clone(),
        config.provider.image_model.clone(),
        config.provider.max_tokens,
        config.provider.request_timeout_secs,
    )
}

/// Build the speech provider from config.
pub fn speech_from_config(config: &NovabudConfig) -> anyhow::Result<ElevenLabsProvider> {
    let api_key = config
        .speech
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("no speech API key. Set ELEVENLABS_API_KEY env var."))?;

    ElevenLabsProvider::new(
        &config.speech.base_url,
        api_key,
        config.speech.voice_id.clone(),
        config.provider.request_timeout_secs,
    )
}
