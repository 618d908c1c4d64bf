//! In-process language intelligence — no JSON-RPC, no transport.
//!
//! Pure functions that operate directly on document content.
//! Uses `lsp-types` for standard data structures (Diagnostic, CompletionItem, etc.)
//! but calls them synchronously.
//!
//! Each document kind gets a struct implementing `LanguageService`.
//! The host feeds it document text and cursor positions and renders results.

pub mod stylesheet;

use lsp_types::{CompletionItem, Diagnostic, Position};
use serde::Serialize;

pub use stylesheet::StylesheetTokenService;

/// Hover information for a position in the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoverInfo {
    /// Content to display (markdown).
    pub content: String,
    /// Optional range the hover applies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<lsp_types::Range>,
}

/// In-process language service — pure functions, no transport.
pub trait LanguageService {
    /// Compute diagnostics for the given content.
    fn diagnostics(&self, content: &str) -> Vec<Diagnostic>;

    /// Compute completions at the given position.
    fn completions(&self, content: &str, pos: Position) -> Vec<CompletionItem>;

    /// Compute hover information at the given position.
    fn hover(&self, content: &str, pos: Position) -> Option<HoverInfo>;
}

/// The line at `pos.line`, if the document has one.
pub(crate) fn line_at(content: &str, pos: Position) -> Option<&str> {
    content.lines().nth(pos.line as usize)
}

/// Text of `line` before character `col`, clamped to the line end.
pub(crate) fn before_cursor(line: &str, col: u32) -> &str {
    match line.char_indices().nth(col as usize) {
        Some((byte, _)) => &line[..byte],
        None => line,
    }
}
