//! Invocation of the external `codesign` utility.
//!
//! Every target is signed with the same argument contract:
//!
//! ```text
//! codesign [--timestamp=none] --sign <identity> --force
//!          --preserve-metadata=identifier,entitlements,requirements
//!          --verbose <path>
//! ```
//!
//! The tool runs synchronously and its exit status decides success. There is
//! no timeout and no retry.

use crate::error::SignFailure;
use crate::{Error, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::info;

/// Metadata that re-signing must carry over from an existing signature.
pub const PRESERVE_METADATA: &str = "--preserve-metadata=identifier,entitlements,requirements";

/// Flag that disables secure timestamping.
pub const NO_TIMESTAMP: &str = "--timestamp=none";

/// Signs a single path.
pub trait SignTool {
    /// Sign `path` in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Signing`] when the tool reports failure and
    /// [`Error::Spawn`] when it could not be started.
    fn sign(&self, path: &Path) -> Result<()>;
}

/// `codesign` subprocess wrapper.
#[derive(Debug, Clone)]
pub struct Codesign {
    program: PathBuf,
    identity: String,
    timestamp: bool,
}

impl Codesign {
    /// Sign with `identity` using the `codesign` found on `PATH`.
    ///
    /// Timestamping is enabled by default.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            program: PathBuf::from("codesign"),
            identity: identity.into(),
            timestamp: true,
        }
    }

    /// Use a specific `codesign` executable.
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Enable or disable secure timestamps.
    pub fn timestamp(mut self, enabled: bool) -> Self {
        self.timestamp = enabled;
        self
    }

    /// Arguments passed to the tool for `path`.
    pub fn arguments(&self, path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::with_capacity(8);
        if !self.timestamp {
            args.push(NO_TIMESTAMP.into());
        }
        args.push("--sign".into());
        args.push(self.identity.as_str().into());
        args.push("--force".into());
        args.push(PRESERVE_METADATA.into());
        args.push("--verbose".into());
        args.push(path.as_os_str().to_owned());
        args
    }
}

impl SignTool for Codesign {
    fn sign(&self, path: &Path) -> Result<()> {
        let output = Command::new(&self.program)
            .args(self.arguments(path))
            .stdin(Stdio::null())
            .output()
            .map_err(|source| Error::Spawn {
                program: self.program.display().to_string(),
                source,
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(Error::Signing {
                path: path.to_path_buf(),
                failure: SignFailure {
                    code: output.status.code(),
                    stderr,
                },
            });
        }

        // codesign reports on stderr even when it succeeds.
        for line in stderr.lines() {
            info!("{line}");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: Vec<OsString>) -> Vec<String> {
        args.into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_arguments_with_timestamp() {
        let codesign = Codesign::new("Developer ID Application: Example (TEAM123456)");
        let args = strings(codesign.arguments(Path::new("/build/Example.app")));

        assert_eq!(
            args,
            vec![
                "--sign",
                "Developer ID Application: Example (TEAM123456)",
                "--force",
                "--preserve-metadata=identifier,entitlements,requirements",
                "--verbose",
                "/build/Example.app",
            ]
        );
    }

    #[test]
    fn test_arguments_without_timestamp() {
        let codesign = Codesign::new("-").timestamp(false);
        let args = strings(codesign.arguments(Path::new("/build/Example.app")));

        assert_eq!(args[0], "--timestamp=none");
        assert_eq!(args[1], "--sign");
        assert_eq!(args[2], "-");
        assert_eq!(args.last().map(String::as_str), Some("/build/Example.app"));
        assert_eq!(args.len(), 7);
    }

    #[test]
    fn test_spawn_failure() {
        let codesign = Codesign::new("-").program("/nonexistent/codesign");
        match codesign.sign(Path::new("/tmp/Example.app")) {
            Err(Error::Spawn { program, .. }) => assert_eq!(program, "/nonexistent/codesign"),
            other => panic!("expected spawn error, got {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_nonzero_exit_is_signing_error() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::tempdir;

        let temp_dir = tempdir().unwrap();
        let fake = temp_dir.path().join("codesign");
        fs::write(&fake, "#!/bin/sh\necho \"$7: no identity found\" >&2\nexit 3\n").unwrap();
        fs::set_permissions(&fake, fs::Permissions::from_mode(0o755)).unwrap();

        let codesign = Codesign::new("-").program(&fake).timestamp(false);
        match codesign.sign(Path::new("/tmp/Example.app")) {
            Err(Error::Signing { path, failure }) => {
                assert_eq!(path, PathBuf::from("/tmp/Example.app"));
                assert_eq!(failure.code, Some(3));
                assert_eq!(failure.stderr, "/tmp/Example.app: no identity found");
            }
            other => panic!("expected signing error, got {other:?}"),
        }
    }
}
