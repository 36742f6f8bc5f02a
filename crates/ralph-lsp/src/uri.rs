//! URI helpers: joining, containment and relative paths.
//!
//! All workspace bookkeeping is keyed by `file://` URIs. Paths are
//! normalized (`.` and `..` resolved) before any comparison, so containment
//! never depends on how the editor spelled a path.

use std::path::{Component, Path, PathBuf};
use url::Url;

/// Normalize a path by resolving `..` and `.` components without touching
/// the filesystem.
pub fn normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                components.pop();
            }
            Component::CurDir => {}
            other => components.push(other),
        }
    }
    components.iter().collect()
}

/// Resolve `relative` against the directory `base` points at.
pub fn join(base: &Url, relative: &str) -> Option<Url> {
    let base_path = base.to_file_path().ok()?;
    let joined = normalize(&base_path.join(relative));
    Url::from_file_path(joined).ok()
}

/// True if `descendant` lives inside (or is) `ancestor`.
pub fn contains(ancestor: &Url, descendant: &Url) -> bool {
    match (ancestor.to_file_path(), descendant.to_file_path()) {
        (Ok(ancestor), Ok(descendant)) => {
            normalize(&descendant).starts_with(normalize(&ancestor))
        }
        _ => false,
    }
}

/// The path of `uri` relative to the directory `base`, with `/` separators.
pub fn relative_path(base: &Url, uri: &Url) -> Option<String> {
    let base_path = normalize(&base.to_file_path().ok()?);
    let uri_path = normalize(&uri.to_file_path().ok()?);
    let relative = uri_path.strip_prefix(&base_path).ok()?;
    let mut parts = Vec::new();
    for component in relative.components() {
        parts.push(component.as_os_str().to_str()?);
    }
    Some(parts.join("/"))
}

/// Parent directory of `uri`.
pub fn parent(uri: &Url) -> Option<Url> {
    let path = uri.to_file_path().ok()?;
    Url::from_file_path(path.parent()?).ok()
}

/// Final path segment of `uri`.
pub fn file_name(uri: &Url) -> Option<String> {
    let path = uri.to_file_path().ok()?;
    Some(path.file_name()?.to_str()?.to_string())
}

/// File extension of `uri`, without the dot.
pub fn extension(uri: &Url) -> Option<String> {
    let path = uri.to_file_path().ok()?;
    Some(path.extension()?.to_str()?.to_string())
}
