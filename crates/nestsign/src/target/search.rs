//! Search directories: where nested targets may live inside a bundle.
//!
//! Every bundle has one or more content directories. Plain bundles use
//! `Contents`; frameworks use one `Versions/<version>` per real version
//! directory. Each content directory is combined with the fixed list in
//! [`SEARCH_SUFFIXES`].

use super::TargetKind;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Locations inside a content directory that may hold nested targets.
pub const SEARCH_SUFFIXES: [&str; 8] = [
    "Frameworks",
    "SharedFrameworks",
    "XPCServices",
    "PlugIns",
    "Support",
    "SharedSupport",
    "Library/LoginItems",
    "Library/LaunchServices",
];

/// Content directory of non-versioned bundles.
pub const CONTENTS_DIR: &str = "Contents";

/// Parent of a framework's version directories.
pub const VERSIONS_DIR: &str = "Versions";

/// Bundle-relative content directories for a target of `kind` at `path`.
///
/// Frameworks read `<path>/Versions` here. The result is not re-validated
/// later, so a tree that changes between classification and traversal can
/// produce stale entries.
pub fn content_directories(kind: TargetKind, path: &Path) -> Vec<PathBuf> {
    match kind {
        TargetKind::App | TargetKind::XpcService => vec![PathBuf::from(CONTENTS_DIR)],
        TargetKind::Framework => framework_versions(path),
        TargetKind::Tool => Vec::new(),
    }
}

/// Bundle-relative search directories for a target of `kind` at `path`.
///
/// This is the product of [`content_directories`] with [`SEARCH_SUFFIXES`],
/// grouped by content directory.
pub fn search_directories(kind: TargetKind, path: &Path) -> Vec<PathBuf> {
    content_directories(kind, path)
        .iter()
        .flat_map(|content| SEARCH_SUFFIXES.iter().map(move |suffix| content.join(suffix)))
        .collect()
}

/// List `Versions/<v>` for every non-hidden, non-symlink entry.
///
/// A missing or unreadable `Versions` directory yields no versions.
fn framework_versions(path: &Path) -> Vec<PathBuf> {
    let versions = path.join(VERSIONS_DIR);

    WalkDir::new(&versions)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!(path = %versions.display(), error = %e, "skipping framework versions");
                None
            }
        })
        .filter(|entry| !entry.path_is_symlink())
        .filter_map(|entry| {
            let name = entry.file_name().to_str()?;
            if name.starts_with('.') {
                return None;
            }
            Some(Path::new(VERSIONS_DIR).join(name))
        })
        .collect()
}
