//! Target kinds and their acceptance predicates.

use crate::inspect::Introspect;
use std::fmt;
use std::fs::Metadata;
use std::path::Path;

/// The closed set of things that carry their own code signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TargetKind {
    /// Application bundle (`.app`).
    App,
    /// Versioned framework bundle (`.framework`).
    Framework,
    /// XPC service bundle (`.xpc`).
    XpcService,
    /// Standalone executable with an embedded Info.plist section.
    Tool,
}

impl TargetKind {
    /// Kinds in the order they are tried. The first kind that accepts a
    /// path wins.
    pub const PRIORITY: [TargetKind; 4] = [
        TargetKind::App,
        TargetKind::Framework,
        TargetKind::XpcService,
        TargetKind::Tool,
    ];

    /// Directory extension for bundle kinds, `None` for [`TargetKind::Tool`].
    pub fn bundle_extension(self) -> Option<&'static str> {
        match self {
            TargetKind::App => Some("app"),
            TargetKind::Framework => Some("framework"),
            TargetKind::XpcService => Some("xpc"),
            TargetKind::Tool => None,
        }
    }

    /// Whether this kind is a directory bundle.
    pub fn is_bundle(self) -> bool {
        self.bundle_extension().is_some()
    }

    /// Whether the bundle keeps its contents under `Versions/<version>`
    /// rather than a fixed `Contents` directory.
    pub fn is_versioned(self) -> bool {
        self == TargetKind::Framework
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetKind::App => "app",
            TargetKind::Framework => "framework",
            TargetKind::XpcService => "xpc",
            TargetKind::Tool => "tool",
        }
    }

    /// Acceptance predicate for a path already known not to be a symlink.
    ///
    /// `metadata` must come from `symlink_metadata` on the same path.
    pub(crate) fn accepts(self, path: &Path, metadata: &Metadata, inspector: &dyn Introspect) -> bool {
        match self.bundle_extension() {
            Some(ext) => {
                metadata.is_dir() && path.extension().map(|e| e == ext).unwrap_or(false)
            }
            // Introspection is a subprocess per file, so it runs last.
            None => metadata.is_file() && is_executable(metadata) && inspector.has_info_plist(path),
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(unix)]
fn is_executable(metadata: &Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &Metadata) -> bool {
    false
}
