//! Output module for saving fetched artifacts
//!
//! File naming follows the extraction service's conventions:
//! `<domain>_clean.html` for cleaned HTML and `<domain>.md` for Markdown,
//! where dots in the domain become underscores.

use crate::fetch::{Artifact, ContentType};
use crate::url::domain_slug;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use url::Url;

/// Default file name for an artifact fetched from `url`
///
/// # Examples
///
/// ```
/// use scrape_relay::output::default_output_path;
/// use scrape_relay::ContentType;
/// use url::Url;
///
/// let url = Url::parse("https://docs.example.com/guide").unwrap();
/// assert_eq!(
///     default_output_path(&url, ContentType::Html).to_str(),
///     Some("docs_example_com_clean.html")
/// );
/// ```
pub fn default_output_path(url: &Url, content_type: ContentType) -> PathBuf {
    let slug = domain_slug(url);
    match content_type {
        ContentType::Html => PathBuf::from(format!("{}_clean.html", slug)),
        ContentType::Markdown => PathBuf::from(format!("{}.md", slug)),
    }
}

/// Writes the artifact's raw content to `path`, creating parent directories
///
/// # Returns
///
/// * `Ok(usize)` - Number of bytes written
/// * `Err(RelayError::Io)` - The file could not be created or written
pub fn write_artifact(path: &Path, artifact: &Artifact) -> crate::Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut file = File::create(path)?;
    file.write_all(artifact.raw_content.as_bytes())?;
    file.flush()?;

    tracing::info!(
        "Saved {} ({} bytes) to {}",
        artifact.url,
        artifact.len(),
        path.display()
    );
    Ok(artifact.len())
}

/// Line printed after saving, e.g. `Markdown saved to: example_com.md`
pub fn saved_notice(path: &Path, content_type: ContentType) -> String {
    let kind = match content_type {
        ContentType::Html => "HTML",
        ContentType::Markdown => "Markdown",
    };
    format!("{} saved to: {}", kind, path.display())
}
