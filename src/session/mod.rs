//! Token session — owns the token table and its load lifecycle.
//!
//! State machine: `Idle` → `Loading` → `Ready` | `Failed`. Callers run
//! `ensure_loaded` before querying; a caller arriving while another load is
//! in flight gets `Readiness::Pending` instead of waiting. A failed load is
//! retried on the next `ensure_loaded`, and the attempt count is kept so
//! repeated failures are distinguishable from never-tried.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::config::TokenSettings;
use crate::error::{TokenError, TokenResult};
use crate::locate;
use crate::lsp::StylesheetTokenService;
use crate::tokens::TokenTable;

/// Why the last load attempt failed.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadFailure {
    pub reason: String,
    pub attempts: u32,
}

/// Load lifecycle of the token table.
#[derive(Debug, Clone, Default)]
pub enum LoadState {
    /// Never attempted (or reset by `reload`).
    #[default]
    Idle,
    Loading,
    Ready(Arc<TokenTable>),
    Failed(LoadFailure),
}

/// Outcome of `ensure_loaded`.
#[derive(Debug)]
pub enum Readiness {
    Ready(Arc<TokenTable>),
    /// Another caller is loading; ask again later.
    Pending,
    Unavailable(TokenError),
}

impl Readiness {
    pub fn table(&self) -> Option<&Arc<TokenTable>> {
        match self {
            Readiness::Ready(table) => Some(table),
            _ => None,
        }
    }
}

/// Per-workspace token session.
pub struct TokenSession {
    settings: TokenSettings,
    state: Arc<Mutex<LoadState>>,
}

impl TokenSession {
    pub fn new(settings: TokenSettings) -> Self {
        Self {
            settings,
            state: Arc::new(Mutex::new(LoadState::Idle)),
        }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Snapshot of the current state.
    pub async fn state(&self) -> LoadState {
        self.state.lock().await.clone()
    }

    /// Load the token table for `document` unless it is already loaded or loading.
    pub async fn ensure_loaded(&self, document: Option<&Path>) -> Readiness {
        let previous_attempts = {
            let mut state = self.state.lock().await;
            let needs_document = self.settings.reference.is_none();
            let attempts = match &*state {
                LoadState::Ready(table) => return Readiness::Ready(table.clone()),
                LoadState::Loading => return Readiness::Pending,
                LoadState::Idle | LoadState::Failed(_) if needs_document && document.is_none() => {
                    return Readiness::Unavailable(TokenError::NoActiveDocument);
                }
                LoadState::Idle => 0,
                LoadState::Failed(failure) => failure.attempts,
            };
            *state = LoadState::Loading;
            attempts
        };

        // The load runs detached so a caller dropping this future never strands `Loading`
        let state = Arc::clone(&self.state);
        let settings = self.settings.clone();
        let document = document.map(Path::to_path_buf);
        let task = tokio::spawn(async move {
            let result = load(&settings, document).await;
            finish(&state, result, previous_attempts).await
        });

        match task.await {
            Ok(readiness) => readiness,
            Err(e) => {
                let error = TokenError::Io(std::io::Error::other(e));
                finish(&self.state, Err(error), previous_attempts).await
            }
        }
    }

    /// Drop the loaded table; the next `ensure_loaded` rescans.
    pub async fn reload(&self) {
        let mut state = self.state.lock().await;
        if !matches!(*state, LoadState::Loading) {
            *state = LoadState::Idle;
        }
    }

    /// A language service over the loaded table, if ready.
    pub async fn service(&self) -> Option<StylesheetTokenService> {
        match &*self.state.lock().await {
            LoadState::Ready(table) => Some(StylesheetTokenService::new(
                table.clone(),
                self.settings.clone(),
            )),
            _ => None,
        }
    }
}

/// Record the outcome of a load attempt.
async fn finish(
    state: &Mutex<LoadState>,
    result: TokenResult<TokenTable>,
    previous_attempts: u32,
) -> Readiness {
    let mut state = state.lock().await;
    match result {
        Ok(table) => {
            let table = Arc::new(table);
            *state = LoadState::Ready(table.clone());
            Readiness::Ready(table)
        }
        Err(e) => {
            let attempts = previous_attempts + 1;
            warn!("token load failed (attempt {attempts}): {e}");
            *state = LoadState::Failed(LoadFailure {
                reason: e.to_string(),
                attempts,
            });
            Readiness::Unavailable(e)
        }
    }
}

async fn load(settings: &TokenSettings, document: Option<PathBuf>) -> TokenResult<TokenTable> {
    let reference = match &settings.reference {
        Some(path) => path.clone(),
        None => {
            let document = document.ok_or(TokenError::NoActiveDocument)?;
            let start = document
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_default();
            let walk_settings = settings.clone();
            tokio::task::spawn_blocking(move || {
                locate::reference_for_document(&document, &walk_settings)
            })
            .await
            .map_err(|e| TokenError::Io(std::io::Error::other(e)))?
            .ok_or(TokenError::ReferenceNotFound { start })?
        }
    };

    info!("loading tokens from {}", reference.display());
    let table = TokenTable::from_file(&reference, &settings.token_prefix).await?;
    info!("ready ({} tokens loaded)", table.len());
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const SHEET: &str = ":root {\n  --ds-color-brand: hsl(200 50% 50%);\n  --ds-gap: 4px;\n}\n";

    fn settings() -> TokenSettings {
        TokenSettings {
            package_name: "@acme/tokens".into(),
            ..Default::default()
        }
    }

    /// Project with a manifest and, optionally, the installed reference stylesheet.
    fn project(with_stylesheet: bool) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("app");
        std::fs::create_dir_all(root.join("src/styles")).unwrap();
        std::fs::write(
            root.join("package.json"),
            r#"{"dependencies": {"@acme/tokens": "1.0.0"}}"#,
        )
        .unwrap();
        if with_stylesheet {
            let css = root.join("node_modules/@acme/tokens/dist/tokens.css");
            std::fs::create_dir_all(css.parent().unwrap()).unwrap();
            std::fs::write(css, SHEET).unwrap();
        }
        let doc = root.join("src/styles/button.css");
        (dir, doc)
    }

    #[tokio::test]
    async fn idle_to_ready() {
        let (_dir, doc) = project(true);
        let session = TokenSession::new(settings());
        assert!(matches!(session.state().await, LoadState::Idle));
        assert!(session.service().await.is_none());

        let readiness = session.ensure_loaded(Some(&doc)).await;
        let table = readiness.table().unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("ds-gap"), Some("4px"));
        assert!(matches!(session.state().await, LoadState::Ready(_)));
        assert!(session.service().await.is_some());

        // Subsequent calls reuse the loaded table
        let again = session.ensure_loaded(None).await;
        assert!(Arc::ptr_eq(again.table().unwrap(), table));
    }

    #[tokio::test]
    async fn no_document_stays_idle() {
        let session = TokenSession::new(settings());
        let readiness = session.ensure_loaded(None).await;
        assert!(matches!(
            readiness,
            Readiness::Unavailable(TokenError::NoActiveDocument)
        ));
        assert!(matches!(session.state().await, LoadState::Idle));
    }

    #[tokio::test]
    async fn failures_count_attempts() {
        let dir = TempDir::new().unwrap();
        let doc = dir.path().join("loose/sheet.css");
        let session = TokenSession::new(TokenSettings {
            package_name: "package-nobody-depends-on-91c2".into(),
            ..Default::default()
        });

        let first = session.ensure_loaded(Some(&doc)).await;
        assert!(matches!(
            first,
            Readiness::Unavailable(TokenError::ReferenceNotFound { .. })
        ));
        session.ensure_loaded(Some(&doc)).await;

        match session.state().await {
            LoadState::Failed(failure) => {
                assert_eq!(failure.attempts, 2);
                assert!(failure.reason.contains("package"));
            }
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_stylesheet_is_guarded() {
        let (_dir, doc) = project(false);
        let session = TokenSession::new(settings());
        let readiness = session.ensure_loaded(Some(&doc)).await;
        assert!(matches!(
            readiness,
            Readiness::Unavailable(TokenError::ReferenceUnreadable { .. })
        ));
        assert!(matches!(session.state().await, LoadState::Failed(_)));
    }

    #[tokio::test]
    async fn loading_answers_pending() {
        let session = TokenSession::new(settings());
        *session.state.lock().await = LoadState::Loading;
        assert!(matches!(
            session.ensure_loaded(Some(Path::new("/tmp/a.css"))).await,
            Readiness::Pending
        ));
        // reload does not interrupt an in-flight load
        session.reload().await;
        assert!(matches!(session.state().await, LoadState::Loading));
    }

    #[tokio::test]
    async fn reload_rescans() {
        let (dir, doc) = project(true);
        let session = TokenSession::new(settings());
        session.ensure_loaded(Some(&doc)).await;

        let css = dir
            .path()
            .join("app/node_modules/@acme/tokens/dist/tokens.css");
        std::fs::write(&css, "--ds-only: 1px;\n").unwrap();

        // Without reload the old table stays
        assert_eq!(session.ensure_loaded(Some(&doc)).await.table().unwrap().len(), 2);

        session.reload().await;
        assert!(matches!(session.state().await, LoadState::Idle));
        let table = session.ensure_loaded(Some(&doc)).await;
        assert_eq!(table.table().unwrap().get("ds-only"), Some("1px"));
    }

    #[tokio::test]
    async fn explicit_reference_needs_no_document() {
        let dir = TempDir::new().unwrap();
        let css = dir.path().join("tokens.css");
        std::fs::write(&css, SHEET).unwrap();
        let session = TokenSession::new(TokenSettings {
            reference: Some(css),
            ..Default::default()
        });
        let readiness = session.ensure_loaded(None).await;
        assert!(readiness.table().unwrap().contains("ds-color-brand"));
    }

    #[tokio::test]
    async fn dropped_caller_still_settles_state() {
        let (_dir, doc) = project(true);
        let session = TokenSession::new(settings());

        // Polls once, then drops the in-flight future
        let dropped =
            tokio::time::timeout(Duration::ZERO, session.ensure_loaded(Some(&doc))).await;
        assert!(dropped.is_err());

        let mut state = session.state().await;
        for _ in 0..500 {
            if !matches!(state, LoadState::Loading) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
            state = session.state().await;
        }
        assert!(matches!(state, LoadState::Ready(_)), "stuck in {state:?}");
        assert!(session.ensure_loaded(Some(&doc)).await.table().is_some());
    }
}
