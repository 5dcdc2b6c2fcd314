use crate::config::RenderConfig;
use crate::fetch::Artifact;
use crate::render::{ConvertingViewer, EditorRenderer, Renderer, TerminalRenderer};
use std::io::Write;

/// What happened while presenting one artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Name of the step that presented the artifact
    pub presented_by: String,

    /// Steps skipped because their tools are not installed
    pub skipped: Vec<String>,

    /// Steps that were attempted and failed, with the error message
    pub failed: Vec<(String, String)>,
}

/// Ordered presentation steps ending in a terminal print
pub struct RenderChain<W: Write> {
    steps: Vec<Box<dyn Renderer>>,
    terminal: TerminalRenderer<W>,
}

impl<W: Write> RenderChain<W> {
    /// The terminal step is a separate argument so a chain can never lack it
    pub fn new(steps: Vec<Box<dyn Renderer>>, terminal: TerminalRenderer<W>) -> Self {
        Self { steps, terminal }
    }

    /// Viewer (with conversion), then editor, then `out`
    pub fn from_config(config: &RenderConfig, out: W) -> Self {
        Self::new(
            vec![
                Box::new(ConvertingViewer::new(
                    config.converter.clone(),
                    config.viewer_or_default(),
                )),
                Box::new(EditorRenderer::new(config.editor.clone())),
            ],
            TerminalRenderer::new(out),
        )
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.terminal.name()))
            .collect()
    }

    /// Presents `artifact` with the first available step that succeeds
    ///
    /// Step failures are logged and superseded by the next step. An error is
    /// returned only when the terminal print itself fails.
    pub fn present(&mut self, artifact: &Artifact) -> crate::Result<RenderReport> {
        let mut report = RenderReport::default();

        for step in self.steps.iter_mut() {
            if !step.is_available() {
                tracing::debug!("Render step {} unavailable, skipping", step.name());
                report.skipped.push(step.name().to_string());
                continue;
            }

            match step.present(artifact) {
                Ok(()) => {
                    tracing::debug!("Presented {} with {}", artifact.url, step.name());
                    report.presented_by = step.name().to_string();
                    return Ok(report);
                }
                Err(e) => {
                    tracing::warn!("Render step {} failed: {}", step.name(), e);
                    report.failed.push((step.name().to_string(), e.to_string()));
                }
            }
        }

        self.terminal.present(artifact)?;
        report.presented_by = self.terminal.name().to_string();
        Ok(report)
    }

    pub fn into_terminal(self) -> TerminalRenderer<W> {
        self.terminal
    }
}
