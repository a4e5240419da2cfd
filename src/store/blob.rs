use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Blob store for generated avatars and voice clips. The store itself is an
/// external service; we only ever put an object and hand its public URL to
/// the client.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` under `key` and return a URL the app can fetch.
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String>;
}

/// Client for an HTTP blob service: `PUT {base}/{key}` with a bearer token,
/// objects readable back from the same URL.
pub struct HttpBlobStore {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl HttpBlobStore {
    pub fn new(base_url: &str, access_token: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> anyhow::Result<String> {
        let url = format!("{}/{key}", self.base_url);

        let mut request = self
            .client
            .put(&url)
            .header("content-type", content_type)
            .body(bytes);
        if let Some(token) = &self.access_token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            anyhow::bail!("blob upload failed: {} for {url}", response.status());
        }

        Ok(url)
    }
}

/// Keeps blobs in a map. Local runs and tests only.
#[derive(Default)]
pub struct MemBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.objects.read().await.contains_key(key)
    }
}

#[async_trait]
impl BlobStore for MemBlobStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> anyhow::Result<String> {
        self.objects
            .write()
            .await
            .insert(key.to_string(), bytes);
        Ok(format!("mem://{key}"))
    }
}
