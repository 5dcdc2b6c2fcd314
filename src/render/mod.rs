//! Render fallback chain
//!
//! A fetched artifact is shown through the first presentation step that is
//! installed and succeeds. Printing to the terminal is always the last step
//! and cannot be left out, so presentation never fails for lack of tools.

mod chain;
mod external;
mod terminal;

pub use chain::{RenderChain, RenderReport};
pub use external::{ConvertingViewer, EditorRenderer};
pub use terminal::TerminalRenderer;

use crate::fetch::Artifact;
use std::path::PathBuf;

/// One way of presenting an artifact
pub trait Renderer {
    /// Short name used in logs and reports
    fn name(&self) -> &str;

    /// Whether the tools this step needs are installed
    ///
    /// An unavailable step is skipped, not counted as a failure.
    fn is_available(&self) -> bool;

    fn present(&mut self, artifact: &Artifact) -> crate::Result<()>;
}

/// Looks up an executable on `PATH`
///
/// Absolute or relative paths are accepted as well and resolved as-is.
pub fn find_on_path(tool: &str) -> Option<PathBuf> {
    if tool.trim().is_empty() {
        return None;
    }
    which::which(tool).ok()
}
