//! NestSign builder API
//!
//! Collects run configuration in one value, then resolves the build
//! product, discovers nested targets and signs them innermost first.

use crate::codesign::{Codesign, SignTool};
use crate::discovery::discover;
use crate::inspect::{Inspector, MachOInspector, Otool};
use crate::order::{sign_all, signing_order};
use crate::target::{resolve_root, Target};
use crate::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Nested bundle signer with builder pattern API.
///
/// # Example
///
/// ```ignore
/// use nestsign::NestSign;
///
/// let report = NestSign::new()
///     .identity("Developer ID Application: Example (TEAM123456)")
///     .build_dir("build/Release")
///     .product_name("Example.app")
///     .timestamp(false)
///     .run()?;
/// ```
#[derive(Debug, Clone)]
pub struct NestSign {
    identity: Option<String>,
    build_dir: Option<PathBuf>,
    product_name: Option<String>,
    product_path: Option<PathBuf>,
    timestamp: bool,
    codesign_program: PathBuf,
    inspector: Inspector,
    dry_run: bool,
}

impl NestSign {
    /// Create a new NestSign builder.
    pub fn new() -> Self {
        Self {
            identity: None,
            build_dir: None,
            product_name: None,
            product_path: None,
            timestamp: true,
            codesign_program: PathBuf::from("codesign"),
            inspector: Inspector::default(),
            dry_run: false,
        }
    }

    /// Set the code signing identity passed to `codesign --sign`.
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Set the directory containing the build product.
    ///
    /// Use together with `product_name()`.
    pub fn build_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.build_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the file name of the build product, e.g. `Example.app`.
    pub fn product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    /// Set the build product path directly.
    ///
    /// Takes precedence over `build_dir()` and `product_name()`.
    pub fn product_path(mut self, path: impl AsRef<Path>) -> Self {
        self.product_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable secure timestamps. Enabled by default.
    pub fn timestamp(mut self, enabled: bool) -> Self {
        self.timestamp = enabled;
        self
    }

    /// Set the `codesign` executable.
    pub fn codesign_program(mut self, program: impl AsRef<Path>) -> Self {
        self.codesign_program = program.as_ref().to_path_buf();
        self
    }

    /// Recognize tools with `otool -l` using the given executable.
    pub fn otool_program(mut self, program: impl AsRef<Path>) -> Self {
        self.inspector = Inspector::Otool(Otool::with_program(program.as_ref()));
        self
    }

    /// Recognize tools by parsing binaries in-process.
    pub fn inspect_in_process(mut self) -> Self {
        self.inspector = Inspector::MachO(MachOInspector);
        self
    }

    /// Discover and order targets without signing anything.
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Validate the builder configuration.
    ///
    /// Returns an error if:
    /// - No identity is set, or it is empty (not checked for dry runs)
    /// - Neither a product path nor both build directory and product name are set
    pub fn validate(&self) -> Result<()> {
        if !self.dry_run && self.identity.as_deref().map_or(true, str::is_empty) {
            return Err(Error::MissingIdentity);
        }
        self.resolved_product_path().map(|_| ())
    }

    /// Absolute or relative path of the build product.
    pub fn resolved_product_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.product_path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("Product path is empty".into()));
            }
            return Ok(path.clone());
        }

        match (&self.build_dir, self.product_name.as_deref()) {
            (Some(dir), Some(name)) if !dir.as_os_str().is_empty() && !name.is_empty() => {
                Ok(dir.join(name))
            }
            (None, _) | (Some(_), None) => Err(Error::Config(
                "Must specify a product path or both build directory and product name".into(),
            )),
            _ => Err(Error::Config(
                "Build directory and product name must not be empty".into(),
            )),
        }
    }

    /// Resolve the product and return every target in signing order.
    ///
    /// This walks the bundle (and removes `codesign` residue) but signs
    /// nothing.
    pub fn plan(&self) -> Result<Vec<Target>> {
        let product = self.resolved_product_path()?;
        let root = resolve_root(&product, &self.inspector)?;
        info!(path = %root.path().display(), kind = %root.kind(), "resolved build product");

        let discovered = discover(&root, &self.inspector);
        info!(count = discovered.len(), "discovered nested targets");

        Ok(signing_order(root, discovered))
    }

    /// Run with the configured `codesign` executable.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The configuration is invalid
    /// - The product is not a recognized target kind
    /// - `codesign` fails on any target; later targets are left unsigned
    pub fn run(&self) -> Result<SignReport> {
        self.validate()?;
        let codesign = Codesign::new(self.identity.clone().unwrap_or_default())
            .program(&self.codesign_program)
            .timestamp(self.timestamp);
        self.execute(&codesign)
    }

    /// Run with a caller-supplied signer.
    pub fn run_with(&self, signer: &dyn SignTool) -> Result<SignReport> {
        self.validate()?;
        self.execute(signer)
    }

    fn execute(&self, signer: &dyn SignTool) -> Result<SignReport> {
        let targets = self.plan()?;

        if self.dry_run {
            info!(count = targets.len(), "dry run, nothing signed");
            return Ok(SignReport {
                targets,
                dry_run: true,
            });
        }

        let signed = sign_all(&targets, signer)?;
        info!(signed, "signing complete");

        Ok(SignReport {
            targets,
            dry_run: false,
        })
    }
}

impl Default for NestSign {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct SignReport {
    targets: Vec<Target>,
    dry_run: bool,
}

impl SignReport {
    /// Targets in signing order.
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Whether signing was skipped.
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
