use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::{ChatProvider, ImageProvider};
use crate::types::ChatTurn;

/// OpenAI-compatible completion + image client. Non-streaming: replies come
/// back whole and get segmented client-side, so there is nothing to stream.
pub struct OpenAiProvider {
    client: Client,
    base_url: String,
    api_key: String,
    chat_model: String,
    image_model: String,
    max_tokens: u32,
}

impl OpenAiProvider {
    pub fn new(
        base_url: &str,
        api_key: String,
        chat_model: String,
        image_model: String,
        max_tokens: u32,
        timeout_secs: u64,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            chat_model,
            image_model,
            max_tokens,
        })
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn complete(&self, turns: &[ChatTurn], temperature: f32) -> anyhow::Result<String> {
        let body = serde_json::json!({
            "model": self.chat_model,
            "messages": turns,
            "max_tokens": self.max_tokens,
            "temperature": temperature,
        });

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("completion request failed: {status}: {text}");
        }

        let parsed: serde_json::Value = response.json().await?;
        let content = parsed
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .ok_or_else(|| anyhow::anyhow!("completion response missing choices[0].message.content"))?;

        debug!(chars = content.len(), "completion received");
        Ok(content.to_string())
    }
}

#[async_trait]
impl ImageProvider for OpenAiProvider {
    async fn generate_image(&self, prompt: &str) -> anyhow::Result<Vec<u8>> {
        let body = serde_json::json!({
            "model": self.image_model,
            "prompt": prompt,
        });

        let response = self
            .client
            .post(format!("{}/v1/images/generations", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            anyhow::bail!("image request failed: {status}: {text}");
        }

        let parsed: serde_json::Value = response.json().await?;
        let b64 = parsed
            .get("data")
            .and_then(|d| d.get(0))
            .and_then(|d| d.get("b64_json"))
            .and_then(|b| b.as_str())
            .ok_or_else(|| anyhow::anyhow!("image response missing data[0].b64_json"))?;

        let bytes = base64::engine::general_purpose::STANDARD.decode(b64)?;
        Ok(bytes)
    }
}
