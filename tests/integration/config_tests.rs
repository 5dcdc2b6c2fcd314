//! Configuration file loading, as the CLI does it

use scrape_relay::cache::CachePolicy;
use scrape_relay::config::{load_config, load_config_with_hash, ExtractionMode};
use scrape_relay::fetch::{HttpExtractor, HttpSessionFactory, Orchestrator};
use scrape_relay::ConfigError;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_full_config_file() {
    let file = write_config(
        r#"
[extractor]
endpoint = "http://scraper.internal:8000"
mode = "clean-html"

[pool]
size = 2
acquire-timeout-ms = 1000

[cache]
ready-ttl-secs = 600
failure-ttl-secs = 30

[fetch]
timeout-ms = 5000
extract-timeout-ms = 4000

[render]
converter = "pandoc"
viewer = "firefox"
editor = "vim"

[[specialized]]
domain = "*.wikipedia.org"

[[specialized]]
domain = "docs.rs"
"#,
    );

    let (config, hash) = load_config_with_hash(file.path()).unwrap();
    assert_eq!(hash.len(), 64);
    assert_eq!(config.extractor.mode, ExtractionMode::CleanHtml);
    assert_eq!(config.pool.size, 2);
    assert_eq!(config.render.viewer_or_default(), "firefox");
    assert_eq!(config.specialized.len(), 2);

    let policy = CachePolicy::from_config(&config.cache);
    assert_eq!(policy.ready_ttl, Some(Duration::from_secs(600)));
    assert_eq!(policy.failure_ttl, Some(Duration::from_secs(30)));

    let orch = Orchestrator::from_config(
        &config,
        HttpSessionFactory::from_config(&config.extractor),
        HttpExtractor::from_config(&config.extractor),
    );
    assert_eq!(orch.pool().stats().size, 2);
    assert_eq!(orch.settings().extract_timeout, Duration::from_millis(4000));
    assert_eq!(orch.cache().policy(), policy);
}

#[test]
fn test_oversized_pool_rejected() {
    let file = write_config("[pool]\nsize = 500\n");
    assert!(matches!(
        load_config(file.path()),
        Err(ConfigError::Validation(_))
    ));
}

#[test]
fn test_unknown_mode_rejected() {
    let file = write_config("[extractor]\nmode = \"pdf\"\n");
    assert!(matches!(load_config(file.path()), Err(ConfigError::Parse(_))));
}

#[tokio::test]
async fn test_custom_specialized_domain_blocks_resolve() {
    let file = write_config("[[specialized]]\ndomain = \"*.docs.rs\"\n");
    let config = load_config(file.path()).unwrap();

    let orch = Orchestrator::from_config(
        &config,
        HttpSessionFactory::from_config(&config.extractor),
        HttpExtractor::from_config(&config.extractor),
    );

    let blocked = orch
        .resolve("https://docs.rs/tokio", Default::default())
        .await;
    assert!(matches!(
        blocked,
        Err(scrape_relay::RelayError::SpecializedScraperExists { .. })
    ));
    // An explicit list replaces the built-in default
    assert_eq!(config.specialized.len(), 1);
}
