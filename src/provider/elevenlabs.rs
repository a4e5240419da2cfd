use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::SpeechProvider;

/// ElevenLabs-style speech client: text-to-speech returning mp3 bytes and
/// speech-to-text over the same API key.
pub struct ElevenLabsProvider {
    client: Client,
    base_url: String,
    api_key: String,
    voice_id: String,
}

impl ElevenLabsProvider {
    pub fn new(
        base_url: &str,
        api_key: String,
        voice_id: String,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            voice_id,
        })
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    async fn synthesize(&self, text: &str) -> anyhow::Result<Vec<u8>> {
        let body = serde_json::json!({
            "text": text,
            "voice_settings": {
                "stability": 0.75,
                "similarity_boost": 0.75,
            },
        });

        let response = self
            .client
            .post(format!(
                "{}/v1/text-to-speech/{}/stream",
                self.base_url, self.voice_id
            ))
            .header("xi-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("speech request failed: {status}: {text}");
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn transcribe(&self, audio: Vec<u8>) -> anyhow::Result<String> {
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("recording.mp3")
            .mime_str("audio/mpeg")?;
        let form = reqwest::multipart::Form::new()
            .text("model_id", "scribe_v1")
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/v1/speech-to-text", self.base_url))
            .header("xi-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("transcription request failed: {status}: {text}");
        }

        let parsed: serde_json::Value = response.json().await?;
        let text = parsed
            .get("text")
            .and_then(|t| t.as_str())
            .ok_or_else(|| anyhow::anyhow!("transcription response missing text"))?;
        Ok(text.to_string())
    }
}
