//! Reference-file locator.
//!
//! Walks up from a document's directory to the first `package.json` that
//! mentions the token package, then points into that package's install
//! directory under `node_modules/`.

use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::config::TokenSettings;

const MANIFEST: &str = "package.json";
const DEPENDENCY_DIR: &str = "node_modules";

/// Find the reference stylesheet for a project containing `start_dir`.
///
/// Returns `None` when no ancestor manifest mentions the package, or when any
/// filesystem error interrupts the walk.
pub fn locate_reference(start_dir: &Path, settings: &TokenSettings) -> Option<PathBuf> {
    match find_project_root(start_dir, &settings.package_name) {
        Ok(Some(root)) => Some(reference_path(&root, settings)),
        Ok(None) => {
            debug!(
                "no manifest mentioning {} above {}",
                settings.package_name,
                start_dir.display()
            );
            None
        }
        Err(e) => {
            warn!("reference lookup from {} failed: {e}", start_dir.display());
            None
        }
    }
}

/// Locate the reference stylesheet for an open document.
pub fn reference_for_document(document: &Path, settings: &TokenSettings) -> Option<PathBuf> {
    let dir = match document.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    locate_reference(dir, settings)
}

/// `<root>/node_modules/<package_name>/<package_css_reference>`.
pub fn reference_path(root: &Path, settings: &TokenSettings) -> PathBuf {
    root.join(DEPENDENCY_DIR)
        .join(&settings.package_name)
        .join(&settings.package_css_reference)
}

/// First ancestor (inclusive) whose manifest mentions `package_name`.
fn find_project_root(start_dir: &Path, package_name: &str) -> io::Result<Option<PathBuf>> {
    let start = resolve(start_dir)?;
    for dir in start.ancestors() {
        debug!("checking {}", dir.display());
        let manifest = dir.join(MANIFEST);
        if !manifest.try_exists()? {
            continue;
        }
        let content = std::fs::read_to_string(&manifest)?;
        if content.contains(package_name) {
            return Ok(Some(dir.to_path_buf()));
        }
    }
    Ok(None)
}

/// Absolute form of `path` with `.` and `..` folded away, without touching symlinks.
fn resolve(path: &Path) -> io::Result<PathBuf> {
    let mut resolved = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other),
        }
    }
    Ok(resolved)
}
