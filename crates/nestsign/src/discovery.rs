//! Breadth-first discovery of nested targets.
//!
//! Starting from the root target's search directories, each level of the
//! walk lists the immediate entries of every frontier directory, classifies
//! them, and queues the search directories of whatever classified. Entries
//! that do not classify are dead ends: the walk follows the nested-bundle
//! layout, not the whole tree.
//!
//! While listing, leftover `codesign` temporary files (names ending in
//! [`TEMP_SUFFIX`]) are deleted.

use crate::inspect::Introspect;
use crate::target::{classify, Target};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Name suffix of temporary files `codesign` leaves behind when interrupted.
pub const TEMP_SUFFIX: &str = ".cstemp";

/// Find every target nested under `root`.
///
/// The root itself is not included. Targets come back in discovery order:
/// level by level, and by file name within a directory, so repeated runs
/// over an unchanged tree return the same sequence. A target reachable
/// through two aliased paths is reported once.
pub fn discover(root: &Target, inspector: &dyn Introspect) -> Vec<Target> {
    let mut discovered = Vec::new();
    let mut seen = HashSet::new();
    seen.insert(identity_key(root.path()));

    let mut frontier: Vec<PathBuf> = root.search_paths().collect();
    let mut level = 0usize;

    while !frontier.is_empty() {
        debug!(level, directories = frontier.len(), "searching frontier");
        let mut next = Vec::new();

        for dir in &frontier {
            if !dir.is_dir() {
                continue;
            }

            for entry in list_entries(dir) {
                let path = entry.path();

                if is_temp_residue(&entry) {
                    remove_residue(path);
                    continue;
                }

                let Some(target) = classify(path, inspector) else {
                    continue;
                };

                if !seen.insert(identity_key(target.path())) {
                    debug!(path = %target.path().display(), "already discovered");
                    continue;
                }

                next.extend(target.search_paths());
                discovered.push(target);
            }
        }

        frontier = next;
        level += 1;
    }

    discovered
}

/// Immediate, non-hidden entries of `dir`, sorted by file name.
fn list_entries(dir: &Path) -> Vec<DirEntry> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "cannot read directory entry");
                None
            }
        })
        .filter(|entry| !is_hidden(entry))
        .collect()
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_temp_residue(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().ends_with(TEMP_SUFFIX)
}

fn remove_residue(path: &Path) {
    let result = match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => debug!(path = %path.display(), "removed codesign residue"),
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove codesign residue"),
    }
}

/// Resolved location of a target, used to detect aliases and cycles.
fn identity_key(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
