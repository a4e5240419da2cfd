use serde::Deserialize;
use std::path::PathBuf;
use tracing::info;

/// Top-level configuration loaded from TOML.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct NovabudConfig {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub auth: AuthConfig,
    pub speech: SpeechConfig,
    pub storage: StorageConfig,
    pub memory: MemoryConfig,
    pub jobs: JobsConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
        }
    }
}

fn default_port() -> u16 {
    7310
}
fn default_bind() -> String {
    "127.0.0.1".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
    #[serde(default = "default_image_model")]
    pub image_model: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            chat_model: default_chat_model(),
            image_model: default_image_model(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com".into()
}
fn default_chat_model() -> String {
    "gpt-4o".into()
}
fn default_image_model() -> String {
    "gpt-image-1".into()
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_timeout_secs() -> u64 {
    30
}

/// Identity provider settings. When `verify_url` is set, bearer tokens are
/// verified remotely; otherwise a shared secret must be supplied on the CLI.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub verify_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub voice_id: String,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io".into(),
            api_key: None,
            voice_id: "nova-default".into(),
        }
    }
}

/// Blob store settings. With no `base_url` the server keeps generated
/// assets in memory, which is only useful for local runs and tests.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub base_url: Option<String>,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Summarization fires on every Nth user message.
    pub summarize_every: u64,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { summarize_every: 3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    pub enabled: bool,
    pub check_in_hours: u64,
    pub reminder_hours: u64,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            check_in_hours: 12,
            reminder_hours: 24,
        }
    }
}

/// Load configuration from file or use defaults.
///
/// Search order:
/// 1. `NOVABUD_CONFIG` env var
/// 2. `~/.novabud/config.toml`
/// 3. Zero-config defaults (no file needed)
pub fn load() -> anyhow::Result<NovabudConfig> {
    let path = config_path();

    if path.exists() {
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
        let mut config: NovabudConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("invalid config at {}: {e}", path.display()))?;

        resolve_secrets(&mut config);
        validate(&config)?;

        info!("loaded config from {}", path.display());
        Ok(config)
    } else {
        info!("no config file found, using zero-config defaults");
        let mut config = NovabudConfig::default();
        resolve_secrets(&mut config);
        Ok(config)
    }
}

fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var("NOVABUD_CONFIG") {
        return PathBuf::from(path);
    }
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".novabud").join("config.toml")
}

/// Resolve API keys from environment variables if not set in config.
fn resolve_secrets(config: &mut NovabudConfig) {
    if config.provider.api_key.is_none() {
        config.provider.api_key = std::env::var("OPENAI_API_KEY").ok();
    }
    if config.speech.api_key.is_none() {
        config.speech.api_key = std::env::var("ELEVENLABS_API_KEY").ok();
    }
}

/// Validate the config and return clear error messages.
pub fn validate(config: &NovabudConfig) -> anyhow::Result<()> {
    if config.provider.max_tokens == 0 {
        anyhow::bail!("provider.max_tokens must be > 0");
    }
    if config.memory.summarize_every == 0 {
        anyhow::bail!("memory.summarize_every must be > 0");
    }
    if config.jobs.enabled && (config.jobs.check_in_hours == 0 || config.jobs.reminder_hours == 0) {
        anyhow::bail!("jobs intervals must be > 0 when jobs are enabled");
    }

    url::Url::parse(&config.provider.base_url)
        .map_err(|e| anyhow::anyhow!("invalid provider.base_url: {e}"))?;
    url::Url::parse(&config.speech.base_url)
        .map_err(|e| anyhow::anyhow!("invalid speech.base_url: {e}"))?;
    if let Some(url) = &config.auth.verify_url {
        url::Url::parse(url).map_err(|e| anyhow::anyhow!("invalid auth.verify_url: {e}"))?;
    }
    if let Some(url) = &config.storage.base_url {
        url::Url::parse(url).map_err(|e| anyhow::anyhow!("invalid storage.base_url: {e}"))?;
    }

    Ok(())
}
