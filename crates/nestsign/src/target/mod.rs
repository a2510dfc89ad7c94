//! Signable targets and their classification.
//!
//! A [`Target`] is a filesystem entry that needs its own code signature:
//! an app, framework or XPC service bundle, or a standalone tool. The
//! classifier tries each [`TargetKind`] in [`TargetKind::PRIORITY`] order
//! and keeps the first match.
//!
//! Symbolic links are never targets. Following them could sign the same
//! bundle twice or reach outside the product tree.
//!
//! # Examples
//!
//! ```no_run
//! use nestsign::inspect::Otool;
//! use nestsign::target::{classify, TargetKind};
//!
//! let otool = Otool::new();
//! if let Some(target) = classify("build/Release/Example.app", &otool) {
//!     assert_eq!(target.kind(), TargetKind::App);
//!     for dir in target.search_paths() {
//!         println!("{}", dir.display());
//!     }
//! }
//! ```

mod kind;
pub mod search;

pub use kind::TargetKind;
pub use search::{content_directories, search_directories, SEARCH_SUFFIXES};

use crate::inspect::Introspect;
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A classified signable entry.
///
/// Search directories are resolved once, at classification time, and the
/// target is never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    path: PathBuf,
    kind: TargetKind,
    search_dirs: Vec<PathBuf>,
}

impl Target {
    pub(crate) fn new(path: PathBuf, kind: TargetKind, search_dirs: Vec<PathBuf>) -> Self {
        Self {
            path,
            kind,
            search_dirs,
        }
    }

    /// Filesystem path of the target.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }

    /// Search directories relative to [`Target::path`].
    pub fn search_directories(&self) -> &[PathBuf] {
        &self.search_dirs
    }

    /// Search directories joined onto the target path.
    pub fn search_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        self.search_dirs.iter().map(|dir| self.path.join(dir))
    }
}

/// Classify `path` as a signable target.
///
/// Returns `None` for symlinks, missing paths and anything no kind accepts.
/// For candidate tools this runs `inspector`, but only on regular files with
/// an execute bit set.
pub fn classify(path: impl AsRef<Path>, inspector: &dyn Introspect) -> Option<Target> {
    let path = path.as_ref();
    let metadata = std::fs::symlink_metadata(path).ok()?;
    if metadata.file_type().is_symlink() {
        return None;
    }

    let kind = TargetKind::PRIORITY
        .into_iter()
        .find(|kind| kind.accepts(path, &metadata, inspector))?;

    let search_dirs = search_directories(kind, path);
    debug!(path = %path.display(), %kind, search_dirs = search_dirs.len(), "classified target");

    Some(Target::new(path.to_path_buf(), kind, search_dirs))
}

/// Classify the build product itself.
///
/// # Errors
///
/// Returns [`Error::UnrecognizedProduct`] if the product matches no kind.
/// Nothing should be signed in that case.
pub fn resolve_root(path: impl AsRef<Path>, inspector: &dyn Introspect) -> Result<Target> {
    let path = path.as_ref();
    classify(path, inspector).ok_or_else(|| Error::UnrecognizedProduct(path.to_path_buf()))
}
