use crate::fetch::Artifact;
use crate::render::Renderer;
use std::io::{self, Write};

/// Prints the artifact's raw content verbatim
///
/// Always available; the last step of every [`RenderChain`](super::RenderChain).
pub struct TerminalRenderer<W: Write> {
    out: W,
}

impl TerminalRenderer<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn name(&self) -> &str {
        "terminal"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn present(&mut self, artifact: &Artifact) -> crate::Result<()> {
        self.out.write_all(artifact.raw_content.as_bytes())?;
        if !artifact.raw_content.ends_with('\n') {
            self.out.write_all(b"\n")?;
        }
        self.out.flush()?;
        Ok(())
    }
}
