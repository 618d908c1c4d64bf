//! Token table — design-token declarations scanned out of a reference stylesheet.
//!
//! A declaration line looks like `--ds-color-brand: hsl(200 50% 50%);`. The
//! token name keeps the prefix marker without its leading `--`
//! (`ds-color-brand`); the value is the rest of the line with terminators
//! removed.

pub mod color;

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use tracing::debug;

use crate::error::{TokenError, TokenResult};

pub use color::{preview, HslColor, TokenPreview};

/// Name → value mapping of every token declared in the reference stylesheet.
///
/// Iteration is ordered by name. A later declaration of the same name replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenTable {
    entries: BTreeMap<String, String>,
}

impl TokenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan stylesheet text for lines starting with `prefix`.
    pub fn extract(text: &str, prefix: &str) -> Self {
        let mut table = Self::new();
        if prefix.is_empty() {
            return table;
        }
        let pattern = format!(r"(?m)^[ \t]*({}.+)$", regex::escape(prefix));
        let Ok(re) = Regex::new(&pattern) else {
            return table;
        };

        for caps in re.captures_iter(text) {
            let line = caps[1].trim_end();
            match split_declaration(line, prefix) {
                Some((name, value)) => table.insert(name, value),
                None => debug!("skipping malformed token line: {line}"),
            }
        }
        table
    }

    /// Read and scan a reference stylesheet.
    pub async fn from_file(path: &Path, prefix: &str) -> TokenResult<Self> {
        let text = tokio::fs::read_to_string(path).await.map_err(|source| {
            TokenError::ReferenceUnreadable {
                path: path.to_path_buf(),
                source,
            }
        })?;
        Ok(Self::extract(&text, prefix))
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Tokens whose name starts with `fragment`.
    pub fn starting_with<'a>(
        &'a self,
        fragment: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.iter().filter(move |(name, _)| name.starts_with(fragment))
    }

    /// Tokens whose name occurs anywhere in `line`.
    pub fn mentioned_in<'a>(
        &'a self,
        line: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.iter().filter(move |(name, _)| line.contains(name))
    }
}

/// Split a matched declaration into `(name, value)`.
///
/// Splits at the first whitespace; a declaration with none (`--ds-x:red;`)
/// splits after its first colon.
fn split_declaration(line: &str, prefix: &str) -> Option<(String, String)> {
    let (decl, value) = match line.find(char::is_whitespace) {
        Some(i) => (&line[..i], &line[i..]),
        None => {
            let colon = line.find(':')?;
            (&line[..=colon], &line[colon + 1..])
        }
    };

    let name = if prefix.starts_with("--") {
        decl.strip_prefix("--").unwrap_or(decl)
    } else {
        decl
    };
    let name = name.strip_suffix(':').unwrap_or(name).trim();
    if name.is_empty() {
        return None;
    }

    Some((name.to_string(), color::strip_terminators(value).to_string()))
}
