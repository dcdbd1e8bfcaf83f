//! Changeset: the ordered lines appended during a reconciliation.

use std::path::Path;

/// An ordered sequence of text lines to append to a configuration artifact.
///
/// Immutable once built. The reconciler appends these lines verbatim; it
/// never parses, deduplicates, or reorders directives already present in
/// the artifact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Changeset {
    lines: Vec<String>,
}

impl Changeset {
    /// Build a changeset from lines (no trailing newlines expected).
    pub fn new(lines: Vec<String>) -> Self {
        Self { lines }
    }

    /// Load a changeset from a file, one directive per line.
    pub fn load<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self {
            lines: content.lines().map(str::to_string).collect(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Render the bytes to append after `existing` artifact content.
    ///
    /// Each line is terminated with `\n`. If the existing content is
    /// non-empty and lacks a trailing newline, one is inserted first so the
    /// appended directives land on their own lines.
    pub fn render(&self, existing: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        if !existing.is_empty() && !existing.ends_with(b"\n") {
            out.push(b'\n');
        }
        for line in &self.lines {
            out.extend_from_slice(line.as_bytes());
            out.push(b'\n');
        }
        out
    }
}
