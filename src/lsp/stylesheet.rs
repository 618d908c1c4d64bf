//! Language service for design tokens in stylesheets (CSS, SCSS, Less).
//!
//! Hover lists every token named on the line, completion offers tokens
//! matching the fragment typed after the prefix marker, and diagnostics flag
//! `var(--...)` references to tokens the reference stylesheet does not declare.

use std::path::Path;
use std::sync::Arc;

use lsp_types::{
    CompletionItem, CompletionItemKind, CompletionTextEdit, Diagnostic, DiagnosticSeverity,
    Position, Range, TextEdit,
};
use regex::Regex;
use tracing::warn;

use super::{before_cursor, line_at, HoverInfo, LanguageService};
use crate::config::TokenSettings;
use crate::tokens::{preview, TokenPreview, TokenTable};

/// Token suggestions backed by a loaded `TokenTable`.
#[derive(Debug, Clone)]
pub struct StylesheetTokenService {
    table: Arc<TokenTable>,
    settings: TokenSettings,
}

impl StylesheetTokenService {
    pub fn new(table: Arc<TokenTable>, settings: TokenSettings) -> Self {
        Self { table, settings }
    }

    pub fn table(&self) -> &TokenTable {
        &self.table
    }

    /// Whether `path` names a document this service answers for.
    pub fn is_supported_document(&self, path: &Path) -> bool {
        is_supported_document(path, &self.settings.document_patterns)
    }
}

/// Match a document's file name against glob patterns such as `*.scss`.
pub fn is_supported_document(path: &Path, patterns: &[String]) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    patterns.iter().any(|p| match glob::Pattern::new(p) {
        Ok(pattern) => pattern.matches(name),
        Err(e) => {
            warn!("invalid document pattern '{p}': {e}");
            false
        }
    })
}

impl LanguageService for StylesheetTokenService {
    fn diagnostics(&self, content: &str) -> Vec<Diagnostic> {
        // Name runs from the prefix marker up to whitespace, a comma or the closing paren
        let pattern = format!(
            r"var\(\s*--({}[^\s,)]*)",
            regex::escape(self.settings.bare_prefix())
        );
        let Ok(re) = Regex::new(&pattern) else {
            return Vec::new();
        };

        let mut diags = Vec::new();
        for (line_idx, line) in content.lines().enumerate() {
            for caps in re.captures_iter(line) {
                let Some(name) = caps.get(1) else { continue };
                if self.table.contains(name.as_str()) {
                    continue;
                }
                let start = line[..name.start()].chars().count() as u32;
                let end = start + name.as_str().chars().count() as u32;
                diags.push(Diagnostic {
                    range: Range::new(
                        Position::new(line_idx as u32, start),
                        Position::new(line_idx as u32, end),
                    ),
                    severity: Some(DiagnosticSeverity::WARNING),
                    source: Some("autotokens".to_string()),
                    message: format!("Unknown design token: '{}'", name.as_str()),
                    ..Default::default()
                });
            }
        }
        diags
    }

    fn completions(&self, content: &str, pos: Position) -> Vec<CompletionItem> {
        let Some(line) = line_at(content, pos) else {
            return Vec::new();
        };
        let before = before_cursor(line, pos.character);

        // Typed fragment runs from the first prefix marker to the cursor
        let Some(start) = before.find(self.settings.bare_prefix()) else {
            return Vec::new();
        };
        let fragment = &before[start..];

        let cursor = before.chars().count() as u32;
        let range = Range::new(
            Position::new(pos.line, cursor - fragment.chars().count() as u32),
            Position::new(pos.line, cursor),
        );

        self.table
            .starting_with(fragment)
            .map(|(name, value)| {
                let shown = preview(value);
                let kind = match shown {
                    TokenPreview::Color { .. } => CompletionItemKind::COLOR,
                    TokenPreview::Literal { .. } => CompletionItemKind::VARIABLE,
                };
                CompletionItem {
                    label: name.to_string(),
                    kind: Some(kind),
                    detail: Some(shown.detail().to_string()),
                    text_edit: Some(CompletionTextEdit::Edit(TextEdit::new(
                        range,
                        name.to_string(),
                    ))),
                    ..Default::default()
                }
            })
            .collect()
    }

    fn hover(&self, content: &str, pos: Position) -> Option<HoverInfo> {
        let line = line_at(content, pos)?;
        let bullets: Vec<String> = self
            .table
            .mentioned_in(line)
            .map(|(name, value)| format!("- `{name}: {value}`"))
            .collect();
        if bullets.is_empty() {
            return None;
        }
        Some(HoverInfo {
            content: format!("**{}**\n{}", self.settings.package_name, bullets.join("\n")),
            range: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc() -> StylesheetTokenService {
        let sheet = "--ds-color-brand: hsl(200 50% 50%);\n--ds-color-bg: #fff;\n--ds-space-2: 0.5rem;\n";
        let settings = TokenSettings {
            package_name: "@acme/tokens".into(),
            ..Default::default()
        };
        let table = TokenTable::extract(sheet, &settings.token_prefix);
        StylesheetTokenService::new(Arc::new(table), settings)
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    // ── Completions ──

    #[test]
    fn completions_filter_by_typed_fragment() {
        let doc = ".btn {\n  color: var(--ds-color-b\n}\n";
        let items = svc().completions(doc, Position::new(1, 26));
        assert_eq!(labels(&items), vec!["ds-color-bg", "ds-color-brand"]);

        let doc = ".btn {\n  color: var(--ds-color-br\n}\n";
        let items = svc().completions(doc, Position::new(1, 27));
        assert_eq!(labels(&items), vec!["ds-color-brand"]);
    }

    #[test]
    fn completion_replaces_fragment() {
        let doc = "  gap: var(--ds-sp";
        let items = svc().completions(doc, Position::new(0, 18));
        assert_eq!(items.len(), 1);
        let Some(CompletionTextEdit::Edit(edit)) = &items[0].text_edit else {
            panic!("expected a text edit");
        };
        assert_eq!(edit.range.start, Position::new(0, 13));
        assert_eq!(edit.range.end, Position::new(0, 18));
        assert_eq!(edit.new_text, "ds-space-2");
    }

    #[test]
    fn color_tokens_show_hex_detail() {
        let items = svc().completions("--ds-color-br", Position::new(0, 13));
        assert_eq!(items[0].kind, Some(CompletionItemKind::COLOR));
        assert_eq!(items[0].detail.as_deref(), Some("#4095bf"));

        let items = svc().completions("--ds-sp", Position::new(0, 7));
        assert_eq!(items[0].kind, Some(CompletionItemKind::VARIABLE));
        assert_eq!(items[0].detail.as_deref(), Some("0.5rem"));
    }

    #[test]
    fn no_marker_no_completions() {
        assert!(svc().completions("  color: red", Position::new(0, 12)).is_empty());
        assert!(svc().completions("x", Position::new(4, 0)).is_empty());
    }

    #[test]
    fn cursor_before_marker_sees_nothing() {
        let doc = "  color: var(--ds-color-brand);";
        assert!(svc().completions(doc, Position::new(0, 9)).is_empty());
    }

    // ── Hover ──

    #[test]
    fn hover_lists_tokens_on_line() {
        let doc = "a {\n  border: 1px solid var(--ds-color-bg);\n}\n";
        let info = svc().hover(doc, Position::new(1, 4)).unwrap();
        assert_eq!(info.content, "**@acme/tokens**\n- `ds-color-bg: #fff`");
    }

    #[test]
    fn hover_multiple_tokens() {
        let doc = "padding: var(--ds-space-2) var(--ds-color-brand);";
        let info = svc().hover(doc, Position::new(0, 0)).unwrap();
        assert!(info.content.contains("ds-space-2: 0.5rem"));
        assert!(info.content.contains("ds-color-brand: hsl(200 50% 50%)"));
    }

    #[test]
    fn hover_without_tokens() {
        assert!(svc().hover("color: red;", Position::new(0, 2)).is_none());
        assert!(svc().hover("", Position::new(3, 0)).is_none());
    }

    // ── Diagnostics ──

    #[test]
    fn diagnostics_flag_unknown_tokens() {
        let doc = "a {\n  color: var(--ds-color-missing);\n  gap: var(--ds-space-2);\n  top: var(--local);\n}\n";
        let diags = svc().diagnostics(doc);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].message.contains("ds-color-missing"));
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diags[0].range.start, Position::new(1, 15));
        assert_eq!(diags[0].range.end, Position::new(1, 31));
    }

    #[test]
    fn diagnostics_cover_names_with_punctuation() {
        let settings = TokenSettings {
            token_prefix: "--a.b-".into(),
            ..Default::default()
        };
        let table = TokenTable::extract("--a.b-x: 1px;\n", &settings.token_prefix);
        let service = StylesheetTokenService::new(Arc::new(table), settings);

        let doc = "a { top: var(--a.b-x); left: var(--a.b-y, 0); right: var(--aXb-z); }";
        let diags = service.diagnostics(doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Unknown design token: 'a.b-y'");
        assert_eq!(diags[0].range.start, Position::new(0, 35));
        assert_eq!(diags[0].range.end, Position::new(0, 40));
    }

    // ── Documents ──

    #[test]
    fn supported_documents() {
        let s = svc();
        assert!(s.is_supported_document(Path::new("/p/styles/main.css")));
        assert!(s.is_supported_document(Path::new("theme.scss")));
        assert!(s.is_supported_document(Path::new("legacy.less")));
        assert!(!s.is_supported_document(Path::new("index.ts")));
        assert!(!s.is_supported_document(Path::new("/")));
    }
}
