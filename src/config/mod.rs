//! Token settings — where the reference stylesheet lives and what marks a token.
//!
//! User-level config: `~/.autotokens/config.yaml`
//! Project-level config: `.autotokens/config.yaml` (relative to the working directory)
//!
//! Resolution: defaults → user config → project config → env vars → CLI flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::{TokenError, TokenResult};

pub const ENV_PREFIX: &str = "AUTOTOKENS_PREFIX";
pub const ENV_PACKAGE: &str = "AUTOTOKENS_PACKAGE";
pub const ENV_CSS_REFERENCE: &str = "AUTOTOKENS_CSS_REFERENCE";

/// Resolved settings for locating and scanning design tokens.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenSettings {
    /// Custom-property prefix marking a declaration as a token (e.g. `--ds-`).
    pub token_prefix: String,
    /// Package whose manifest mention identifies the project root.
    pub package_name: String,
    /// Stylesheet path relative to the package's install directory.
    pub package_css_reference: String,
    /// File-name patterns of documents that get token suggestions.
    pub document_patterns: Vec<String>,
    /// Explicit reference stylesheet; skips the manifest walk when set.
    pub reference: Option<PathBuf>,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            token_prefix: "--ds-".into(),
            package_name: "design-tokens".into(),
            package_css_reference: "dist/tokens.css".into(),
            document_patterns: vec!["*.css".into(), "*.scss".into(), "*.less".into()],
            reference: None,
        }
    }
}

/// A partial settings file. Every field is optional so files only override what they name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsFile {
    #[serde(default)]
    pub token_prefix: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub package_css_reference: Option<String>,
    #[serde(default)]
    pub document_patterns: Option<Vec<String>>,
    #[serde(default)]
    pub reference: Option<PathBuf>,
}

/// Path to `~/.autotokens/config.yaml`.
fn user_config_path() -> Option<PathBuf> {
    #[cfg(windows)]
    {
        std::env::var("USERPROFILE")
            .ok()
            .map(|p| PathBuf::from(p).join(".autotokens").join("config.yaml"))
    }
    #[cfg(not(windows))]
    {
        std::env::var("HOME")
            .ok()
            .map(|p| PathBuf::from(p).join(".autotokens").join("config.yaml"))
    }
}

const PROJECT_CONFIG: &str = ".autotokens/config.yaml";

impl TokenSettings {
    /// Load settings from user + project files and the environment.
    ///
    /// `explicit` replaces the project-level file when given (the CLI's `--config`).
    pub fn load(explicit: Option<&Path>) -> TokenResult<Self> {
        let mut settings = Self::default();

        if let Some(path) = user_config_path() {
            if let Some(file) = read_settings_file(&path, false)? {
                settings.merge(file);
            }
        }

        let project = explicit
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(PROJECT_CONFIG));
        if let Some(file) = read_settings_file(&project, explicit.is_some())? {
            settings.merge(file);
        }

        settings.apply_env(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    /// Overlay the fields a settings file names.
    pub fn merge(&mut self, file: SettingsFile) {
        if let Some(prefix) = file.token_prefix {
            self.token_prefix = prefix;
        }
        if let Some(name) = file.package_name {
            self.package_name = name;
        }
        if let Some(reference) = file.package_css_reference {
            self.package_css_reference = reference;
        }
        if let Some(patterns) = file.document_patterns {
            self.document_patterns = patterns;
        }
        if file.reference.is_some() {
            self.reference = file.reference;
        }
    }

    /// Overlay environment overrides. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(prefix) = get(ENV_PREFIX) {
            self.token_prefix = prefix;
        }
        if let Some(name) = get(ENV_PACKAGE) {
            self.package_name = name;
        }
        if let Some(reference) = get(ENV_CSS_REFERENCE) {
            self.package_css_reference = reference;
        }
    }

    pub fn validate(&self) -> TokenResult<()> {
        if self.token_prefix.trim().is_empty() {
            return Err(TokenError::Config("token_prefix must not be empty".into()));
        }
        if self.reference.is_none() && self.package_name.trim().is_empty() {
            return Err(TokenError::Config(
                "package_name must not be empty without an explicit reference".into(),
            ));
        }
        Ok(())
    }

    /// The prefix marker as it appears in token names (`--ds-` → `ds-`).
    pub fn bare_prefix(&self) -> &str {
        self.token_prefix
            .strip_prefix("--")
            .unwrap_or(&self.token_prefix)
    }
}

/// Read a settings file. A missing file is `None` unless `required`.
fn read_settings_file(path: &Path, required: bool) -> TokenResult<Option<SettingsFile>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound && !required => {
            debug!("no settings at {}", path.display());
            return Ok(None);
        }
        Err(e) => {
            return Err(TokenError::Config(format!(
                "failed to read {}: {e}",
                path.display()
            )))
        }
    };
    if content.trim().is_empty() {
        return Ok(Some(SettingsFile::default()));
    }
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|e| TokenError::Config(format!("{}: {e}", path.display())))
}
