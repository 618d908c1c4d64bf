//! autotokens — design-token hover and completion for stylesheets.
//!
//! Scans a reference stylesheet for custom properties carrying a prefix
//! marker and answers hover, completion and diagnostic queries over
//! CSS/SCSS/Less documents as in-process language-service calls.

pub mod config;
pub mod error;
pub mod locate;
pub mod lsp;
pub mod session;
pub mod tokens;
