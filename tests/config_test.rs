use novabud::config::{NovabudConfig, validate};

#[test]
fn defaults_are_sane() {
    let config = NovabudConfig::default();
    assert_eq!(config.server.port, 7310);
    assert_eq!(config.server.bind, "127.0.0.1");
    assert_eq!(config.provider.chat_model, "gpt-4o");
    assert_eq!(config.memory.summarize_every, 3);
    assert!(config.jobs.enabled);
    assert_eq!(config.jobs.check_in_hours, 12);
    assert_eq!(config.jobs.reminder_hours, 24);
    assert!(validate(&config).is_ok());
}

#[test]
fn partial_toml_fills_in_defaults() {
    let config: NovabudConfig = toml::from_str(
        r#"
        [server]
        port = 9000

        [provider]
        chat_model = "gpt-4o-mini"

        [memory]
        summarize_every = 5
        "#,
    )
    .unwrap();

    assert_eq!(config.server.port, 9000);
    assert_eq!(config.server.bind, "127.0.0.1");
    assert_eq!(config.provider.chat_model, "gpt-4o-mini");
    assert_eq!(config.provider.max_tokens, 1024);
    assert_eq!(config.memory.summarize_every, 5);
}

#[test]
fn zero_max_tokens_is_rejected() {
    let mut config = NovabudConfig::default();
    config.provider.max_tokens = 0;
    assert!(validate(&config).is_err());
}

#[test]
fn zero_summarize_interval_is_rejected() {
    let mut config = NovabudConfig::default();
    config.memory.summarize_every = 0;
    assert!(validate(&config).is_err());
}

#[test]
fn bad_provider_url_is_rejected() {
    let mut config = NovabudConfig::default();
    config.provider.base_url = "not a url".into();
    assert!(validate(&config).is_err());
}

#[test]
fn zero_job_interval_is_rejected_only_when_jobs_enabled() {
    let mut config = NovabudConfig::default();
    config.jobs.check_in_hours = 0;
    assert!(validate(&config).is_err());

    config.jobs.enabled = false;
    assert!(validate(&config).is_ok());
}

#[test]
fn auth_section_parses() {
    let config: NovabudConfig = toml::from_str(
        r#"
        [auth]
        verify_url = "https://id.example.com/v1/verify"
        "#,
    )
    .unwrap();
    assert_eq!(
        config.auth.verify_url.as_deref(),
        Some("https://id.example.com/v1/verify")
    );
    assert!(validate(&config).is_ok());
}
