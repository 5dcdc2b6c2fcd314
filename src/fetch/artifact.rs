//! Fetched page content

use chrono::{DateTime, Utc};
use scraper::{Html, Selector};
use std::fmt;

/// Format of an artifact's raw content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Html,
    Markdown,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "markdown",
        }
    }

    /// File extension used when the artifact is written to disk
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extracted page content
///
/// Immutable once built. The cache and every caller share one copy through
/// `Arc<Artifact>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Normalized URL the content was fetched for
    pub url: String,

    pub raw_content: String,

    pub content_type: ContentType,

    pub fetched_at: DateTime<Utc>,

    /// Page title from `<title>` (HTML) or the first `# ` heading (Markdown)
    pub title: Option<String>,
}

impl Artifact {
    pub fn new(
        url: impl Into<String>,
        raw_content: impl Into<String>,
        content_type: ContentType,
    ) -> Self {
        let raw_content = raw_content.into();
        let title = match content_type {
            ContentType::Html => html_title(&raw_content),
            ContentType::Markdown => markdown_title(&raw_content),
        };

        Self {
            url: url.into(),
            raw_content,
            content_type,
            fetched_at: Utc::now(),
            title,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.raw_content.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.raw_content.len()
    }
}

/// Extracts the page title from an HTML document
fn html_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn markdown_title(markdown: &str) -> Option<String> {
    markdown
        .lines()
        .find_map(|line| line.trim_start().strip_prefix("# "))
        .map(|title| title.trim().to_string())
        .filter(|s| !s.is_empty())
}
