//! Mach-O introspection used to recognize standalone tools.
//!
//! A plain executable only counts as a signable tool when its binary embeds
//! an `__info_plist` section, which is where `codesign` recovers the signing
//! identifier for a file that lives outside any bundle.
//!
//! Two implementations of [`Introspect`] are provided:
//! - [`Otool`] shells out to `otool -l` and looks for the section name in
//!   the dumped load commands.
//! - [`MachOInspector`] parses the binary in-process with goblin, covering
//!   both thin and fat files.
//!
//! Neither ever fails loudly: anything that cannot be inspected is simply
//! not a tool.

use goblin::mach::{Mach, MachO};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Section name that marks an executable as carrying an embedded Info.plist.
pub const INFO_PLIST_SECTION: &str = "__info_plist";

/// Yes/no predicate over executable files.
pub trait Introspect {
    /// Returns `true` if the binary at `path` embeds an `__info_plist` section.
    fn has_info_plist(&self, path: &Path) -> bool;
}

/// Introspection through the `otool` command-line utility.
#[derive(Debug, Clone)]
pub struct Otool {
    program: PathBuf,
}

impl Otool {
    /// Use the `otool` found on `PATH`.
    pub fn new() -> Self {
        Self::with_program("otool")
    }

    /// Use a specific `otool` executable.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Path of the executable this inspector runs.
    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Default for Otool {
    fn default() -> Self {
        Self::new()
    }
}

impl Introspect for Otool {
    fn has_info_plist(&self, path: &Path) -> bool {
        let output = Command::new(&self.program)
            .arg("-l")
            .arg(path)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output();

        match output {
            Ok(output) => String::from_utf8_lossy(&output.stdout).contains(INFO_PLIST_SECTION),
            Err(e) => {
                debug!(program = %self.program.display(), path = %path.display(), error = %e, "otool could not be started");
                false
            }
        }
    }
}

/// In-process introspection using goblin.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachOInspector;

impl MachOInspector {
    /// Check raw file contents for an `__info_plist` section.
    ///
    /// Fat binaries match if any architecture slice carries the section.
    pub fn data_has_info_plist(data: &[u8]) -> bool {
        let Ok(mach) = Mach::parse(data) else {
            return false;
        };

        match mach {
            Mach::Binary(macho) => Self::macho_has_info_plist(&macho),
            Mach::Fat(fat) => fat.iter_arches().filter_map(|arch| arch.ok()).any(|arch| {
                let offset = arch.offset as usize;
                let size = arch.size as usize;
                let Some(slice_data) = offset
                    .checked_add(size)
                    .and_then(|end| data.get(offset..end))
                else {
                    return false;
                };
                MachO::parse(slice_data, 0)
                    .map(|macho| Self::macho_has_info_plist(&macho))
                    .unwrap_or(false)
            }),
        }
    }

    fn macho_has_info_plist(macho: &MachO) -> bool {
        macho
            .segments
            .sections()
            .flatten()
            .filter_map(|section| section.ok())
            .any(|(section, _)| {
                section
                    .name()
                    .map(|name| name == INFO_PLIST_SECTION)
                    .unwrap_or(false)
            })
    }
}

impl Introspect for MachOInspector {
    fn has_info_plist(&self, path: &Path) -> bool {
        match std::fs::read(path) {
            Ok(data) => Self::data_has_info_plist(&data),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "could not read binary");
                false
            }
        }
    }
}

/// Introspection strategy selected by configuration.
#[derive(Debug, Clone)]
pub enum Inspector {
    /// Run `otool -l` (the default).
    Otool(Otool),
    /// Parse the binary in-process.
    MachO(MachOInspector),
}

impl Default for Inspector {
    fn default() -> Self {
        Inspector::Otool(Otool::new())
    }
}

impl Introspect for Inspector {
    fn has_info_plist(&self, path: &Path) -> bool {
        match self {
            Inspector::Otool(otool) => otool.has_info_plist(path),
            Inspector::MachO(macho) => macho.has_info_plist(path),
        }
    }
}
