//! Presentation through external programs

use crate::fetch::{Artifact, ContentType};
use crate::render::{find_on_path, Renderer};
use crate::url::domain_slug;
use crate::RelayError;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use url::Url;

/// Converts Markdown to HTML and opens the result in a graphical viewer
///
/// The converter is invoked as `<converter> <in.md> -o <out.html>`. HTML
/// artifacts are opened as they are.
#[derive(Debug, Clone)]
pub struct ConvertingViewer {
    converter: String,
    viewer: String,
    workdir: PathBuf,
}

impl ConvertingViewer {
    pub fn new(converter: impl Into<String>, viewer: impl Into<String>) -> Self {
        Self {
            converter: converter.into(),
            viewer: viewer.into(),
            workdir: std::env::temp_dir(),
        }
    }

    /// Directory the intermediate and converted files are written to
    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }

    fn convert(&self, input: &Path) -> crate::Result<PathBuf> {
        let output = input.with_extension("html");
        let status = Command::new(&self.converter)
            .arg(input)
            .arg("-o")
            .arg(&output)
            .status()?;

        if !status.success() {
            return Err(RelayError::Render(format!(
                "{} exited with {}",
                self.converter, status
            )));
        }
        if !output.exists() {
            return Err(RelayError::Render(format!(
                "{} produced no output",
                self.converter
            )));
        }
        Ok(output)
    }
}

impl Renderer for ConvertingViewer {
    fn name(&self) -> &str {
        "viewer"
    }

    fn is_available(&self) -> bool {
        find_on_path(&self.converter).is_some() && find_on_path(&self.viewer).is_some()
    }

    fn present(&mut self, artifact: &Artifact) -> crate::Result<()> {
        let written = write_scratch(&self.workdir, artifact)?;
        let page = match artifact.content_type {
            ContentType::Markdown => self.convert(&written)?,
            ContentType::Html => written,
        };

        tracing::debug!("Opening {} with {}", page.display(), self.viewer);
        Command::new(&self.viewer).arg(&page).spawn()?;
        Ok(())
    }
}

/// Opens the artifact in an external editor
#[derive(Debug, Clone)]
pub struct EditorRenderer {
    editor: String,
    workdir: PathBuf,
}

impl EditorRenderer {
    pub fn new(editor: impl Into<String>) -> Self {
        Self {
            editor: editor.into(),
            workdir: std::env::temp_dir(),
        }
    }

    pub fn with_workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = workdir.into();
        self
    }
}

impl Renderer for EditorRenderer {
    fn name(&self) -> &str {
        "editor"
    }

    fn is_available(&self) -> bool {
        find_on_path(&self.editor).is_some()
    }

    fn present(&mut self, artifact: &Artifact) -> crate::Result<()> {
        let written = write_scratch(&self.workdir, artifact)?;
        tracing::debug!("Opening {} with {}", written.display(), self.editor);
        Command::new(&self.editor).arg(&written).spawn()?;
        Ok(())
    }
}

/// Writes the artifact to a uniquely named file that outlives this process
///
/// Viewers and editors open the file asynchronously, so it is kept rather
/// than deleted on drop.
fn write_scratch(workdir: &Path, artifact: &Artifact) -> crate::Result<PathBuf> {
    fs::create_dir_all(workdir)?;

    let prefix = Url::parse(&artifact.url)
        .map(|url| domain_slug(&url))
        .unwrap_or_else(|_| "page".to_string());
    let suffix = format!(".{}", artifact.content_type.extension());

    let file = tempfile::Builder::new()
        .prefix(&format!("{}_", prefix))
        .suffix(&suffix)
        .tempfile_in(workdir)?;
    fs::write(file.path(), artifact.raw_content.as_bytes())?;

    let (_, path) = file
        .keep()
        .map_err(|e| RelayError::Render(format!("could not keep scratch file: {}", e)))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn markdown() -> Artifact {
        Artifact::new("https://docs.example.com/a", "# Doc\n", ContentType::Markdown)
    }

    #[test]
    fn test_unavailable_when_tool_missing() {
        let viewer = ConvertingViewer::new("scrape-relay-missing-converter", "sh");
        assert!(!viewer.is_available());

        let editor = EditorRenderer::new("scrape-relay-missing-editor");
        assert!(!editor.is_available());
    }

    #[test]
    fn test_scratch_file_named_after_domain() {
        let dir = TempDir::new().unwrap();
        let path = write_scratch(dir.path(), &markdown()).unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("docs_example_com_"));
        assert!(name.ends_with(".md"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "# Doc\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_converter_without_output_fails() {
        let dir = TempDir::new().unwrap();
        let mut viewer = ConvertingViewer::new("true", "true").with_workdir(dir.path());

        assert!(viewer.is_available());
        let result = viewer.present(&markdown());
        assert!(matches!(result, Err(RelayError::Render(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_converts_then_opens() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("fake-pandoc");
        fs::write(&script, "#!/bin/sh\ncp \"$1\" \"$3\"\n").unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        let mut viewer = ConvertingViewer::new(script.to_string_lossy(), "true")
            .with_workdir(dir.path().join("out"));
        viewer.present(&markdown()).unwrap();

        let converted: Vec<PathBuf> = fs::read_dir(dir.path().join("out"))
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "html"))
            .collect();
        assert_eq!(converted.len(), 1);
        assert_eq!(fs::read_to_string(&converted[0]).unwrap(), "# Doc\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_editor_opens_file() {
        let dir = TempDir::new().unwrap();
        let mut editor = EditorRenderer::new("true").with_workdir(dir.path());

        assert!(editor.is_available());
        editor.present(&markdown()).unwrap();
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
