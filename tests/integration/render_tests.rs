//! Render chain fallback with tools that are not installed

use scrape_relay::config::RenderConfig;
use scrape_relay::output::{default_output_path, write_artifact};
use scrape_relay::render::{
    ConvertingViewer, EditorRenderer, RenderChain, Renderer, TerminalRenderer,
};
use scrape_relay::{Artifact, ContentType};
use tempfile::TempDir;
use url::Url;

fn missing_tools() -> RenderConfig {
    RenderConfig {
        converter: "scrape-relay-missing-pandoc".to_string(),
        viewer: Some("scrape-relay-missing-viewer".to_string()),
        editor: "scrape-relay-missing-editor".to_string(),
    }
}

#[test]
fn test_chain_degrades_to_raw_text() {
    let artifact = Artifact::new(
        "https://example.com/a",
        "# Heading\n\nSome *markdown*.",
        ContentType::Markdown,
    );

    let mut chain = RenderChain::from_config(&missing_tools(), Vec::new());
    let report = chain.present(&artifact).unwrap();

    assert_eq!(report.presented_by, "terminal");
    assert_eq!(report.skipped, vec!["viewer", "editor"]);
    assert!(report.failed.is_empty());
    assert_eq!(
        String::from_utf8(chain.into_terminal().into_inner()).unwrap(),
        "# Heading\n\nSome *markdown*.\n"
    );
}

#[test]
fn test_explicit_steps_missing() {
    let dir = TempDir::new().unwrap();
    let steps: Vec<Box<dyn Renderer>> = vec![
        Box::new(
            ConvertingViewer::new("scrape-relay-missing-pandoc", "scrape-relay-missing-viewer")
                .with_workdir(dir.path()),
        ),
        Box::new(EditorRenderer::new("scrape-relay-missing-editor").with_workdir(dir.path())),
    ];
    let artifact = Artifact::new("https://example.com/", "<p>html</p>", ContentType::Html);

    let mut chain = RenderChain::new(steps, TerminalRenderer::new(Vec::new()));
    let report = chain.present(&artifact).unwrap();

    assert_eq!(report.presented_by, "terminal");
    // Skipped steps never touch the filesystem
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn test_save_under_default_name() {
    let dir = TempDir::new().unwrap();
    let artifact = Artifact::new(
        "https://news.example.com/story",
        "<html><body>story</body></html>",
        ContentType::Html,
    );

    let url = Url::parse(&artifact.url).unwrap();
    let path = dir
        .path()
        .join(default_output_path(&url, artifact.content_type));
    write_artifact(&path, &artifact).unwrap();

    assert!(path.ends_with("news_example_com_clean.html"));
    assert_eq!(
        std::fs::read_to_string(&path).unwrap(),
        "<html><body>story</body></html>"
    );
}
