//! Error types for nestsign operations.
//!
//! This module defines the [`enum@Error`] enum covering every way a run can
//! stop: bad configuration, a build product that is not a recognized bundle
//! or tool, and a failed `codesign` invocation.
//!
//! Entries that simply fail to classify during discovery are not errors and
//! never appear here.
//!
//! # See Also
//!
//! - [`crate::Result`] - Convenience type alias using this error

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Error type for nestsign operations.
///
/// All public functions in this crate return [`crate::Result<T>`], which uses this error type.
///
/// # Examples
///
/// ```no_run
/// use nestsign::{Error, NestSign};
///
/// let result = NestSign::new()
///     .identity("Developer ID Application: Example")
///     .product_path("build/Release/Example.app")
///     .run();
/// match result {
///     Ok(report) => println!("signed {} targets", report.targets().len()),
///     Err(Error::Signing { path, .. }) => eprintln!("codesign failed on {}", path.display()),
///     Err(e) => eprintln!("{e}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or incomplete configuration.
    ///
    /// Raised before any discovery work when the product location cannot
    /// be determined.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No code signing identity was configured.
    #[error("Missing code signing identity")]
    MissingIdentity,

    /// The build product matched none of the known target kinds.
    ///
    /// Nothing is signed when this happens.
    #[error("Unrecognized product: {} is not an app, framework, XPC service or tool", .0.display())]
    UnrecognizedProduct(PathBuf),

    /// The signing tool could not be started at all.
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The signing tool exited unsuccessfully.
    ///
    /// Targets later in the signing order were left untouched.
    #[error("Signing failed for {}: {failure}", .path.display())]
    Signing { path: PathBuf, failure: SignFailure },
}

/// Outcome of one unsuccessful `codesign` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignFailure {
    /// Exit code, or `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    /// Captured standard error of the process.
    pub stderr: String,
}

impl fmt::Display for SignFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit status {code}")?,
            None => write!(f, "terminated by signal")?,
        }
        // Keep the rendered message on one line.
        let detail = self.stderr.split_whitespace().collect::<Vec<_>>().join(" ");
        if !detail.is_empty() {
            write!(f, " ({detail})")?;
        }
        Ok(())
    }
}
