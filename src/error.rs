//! Error types for token location and loading.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("no active document")]
    NoActiveDocument,

    #[error("no package manifest mentioning the token package above {}", .start.display())]
    ReferenceNotFound { start: PathBuf },

    #[error("reference stylesheet {} unreadable: {source}", .path.display())]
    ReferenceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TokenResult<T> = Result<T, TokenError>;
