//! Signing order and dispatch.
//!
//! Signing a bundle seals the hashes of everything inside it, so nested
//! targets must be signed before the bundles that contain them. A nested
//! target's path always extends its container's path, which makes "longest
//! path first" a sufficient order.

use crate::codesign::SignTool;
use crate::target::Target;
use crate::Result;
use tracing::info;

/// Combine the root with its discovered targets and sort them for signing.
///
/// Targets are ordered by descending path length. The sort is stable:
/// targets of equal length keep their input order, root first and then
/// discovery order.
pub fn signing_order(root: Target, discovered: Vec<Target>) -> Vec<Target> {
    let mut targets = Vec::with_capacity(discovered.len() + 1);
    targets.push(root);
    targets.extend(discovered);
    sort_deepest_first(&mut targets);
    targets
}

/// Stable sort by descending path length.
pub fn sort_deepest_first(targets: &mut [Target]) {
    targets.sort_by_key(|target| std::cmp::Reverse(path_len(target)));
}

fn path_len(target: &Target) -> usize {
    target.path().as_os_str().len()
}

/// Sign `targets` one at a time, in the given order.
///
/// Stops at the first failure; targets after it are not attempted. Returns
/// the number of targets signed.
///
/// # Errors
///
/// Propagates the first error reported by `signer`.
pub fn sign_all(targets: &[Target], signer: &dyn SignTool) -> Result<usize> {
    let total = targets.len();
    for (index, target) in targets.iter().enumerate() {
        info!(
            step = index + 1,
            total,
            kind = %target.kind(),
            path = %target.path().display(),
            "signing"
        );
        signer.sign(target.path())?;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SignFailure;
    use crate::target::TargetKind;
    use crate::Error;
    use std::cell::RefCell;
    use std::path::{Path, PathBuf};

    fn tool(path: &str) -> Target {
        Target::new(PathBuf::from(path), TargetKind::Tool, Vec::new())
    }

    fn lens(targets: &[Target]) -> Vec<usize> {
        targets.iter().map(|t| t.path().as_os_str().len()).collect()
    }

    /// Records every path and fails on the configured one.
    #[derive(Default)]
    struct RecordingSigner {
        signed: RefCell<Vec<PathBuf>>,
        fail_on: Option<PathBuf>,
    }

    impl SignTool for RecordingSigner {
        fn sign(&self, path: &Path) -> Result<()> {
            self.signed.borrow_mut().push(path.to_path_buf());
            if self.fail_on.as_deref() == Some(path) {
                return Err(Error::Signing {
                    path: path.to_path_buf(),
                    failure: SignFailure {
                        code: Some(1),
                        stderr: "rejected".into(),
                    },
                });
            }
            Ok(())
        }
    }

    /// A target whose path is exactly `len` bytes long.
    fn tool_of_len(len: usize) -> Target {
        tool(&format!("/{}", "a".repeat(len - 1)))
    }

    #[test]
    fn test_descending_path_length() {
        let root = tool_of_len(10);
        let discovered = vec![tool_of_len(25), tool_of_len(15), tool_of_len(40)];
        let ordered = signing_order(root, discovered);
        assert_eq!(lens(&ordered), vec![40, 25, 15, 10]);
    }

    #[test]
    fn test_nested_before_container() {
        let root = tool("/b/App.app");
        let discovered = vec![
            tool("/b/App.app/Contents/Frameworks/A.framework"),
            tool("/b/App.app/Contents/Frameworks/A.framework/Versions/A/XPCServices/X.xpc"),
        ];
        let ordered = signing_order(root, discovered);

        let position = |p: &str| ordered.iter().position(|t| t.path() == Path::new(p)).unwrap();
        assert!(
            position("/b/App.app/Contents/Frameworks/A.framework/Versions/A/XPCServices/X.xpc")
                < position("/b/App.app/Contents/Frameworks/A.framework")
        );
        assert!(position("/b/App.app/Contents/Frameworks/A.framework") < position("/b/App.app"));
    }

    #[test]
    fn test_equal_lengths_keep_discovery_order() {
        let root = tool("/r");
        let discovered = vec![tool("/x/b"), tool("/x/a"), tool("/x/c")];
        let ordered = signing_order(root, discovered);

        let paths: Vec<_> = ordered.iter().map(|t| t.path().to_path_buf()).collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/x/b"),
                PathBuf::from("/x/a"),
                PathBuf::from("/x/c"),
                PathBuf::from("/r"),
            ]
        );
    }

    #[test]
    fn test_sign_all_in_order() {
        let targets = vec![tool("/long/path/one"), tool("/short")];
        let signer = RecordingSigner::default();

        assert_eq!(sign_all(&targets, &signer).unwrap(), 2);
        assert_eq!(
            *signer.signed.borrow(),
            vec![PathBuf::from("/long/path/one"), PathBuf::from("/short")]
        );
    }

    #[test]
    fn test_sign_all_stops_at_first_failure() {
        let targets = vec![tool("/one/two/three"), tool("/one/two"), tool("/one")];
        let signer = RecordingSigner {
            fail_on: Some(PathBuf::from("/one/two")),
            ..Default::default()
        };

        let err = sign_all(&targets, &signer).unwrap_err();
        assert!(matches!(err, Error::Signing { ref path, .. } if path == Path::new("/one/two")));
        assert_eq!(
            *signer.signed.borrow(),
            vec![PathBuf::from("/one/two/three"), PathBuf::from("/one/two")]
        );
    }

    #[test]
    fn test_sign_all_empty() {
        let signer = RecordingSigner::default();
        assert_eq!(sign_all(&[], &signer).unwrap(), 0);
        assert!(signer.signed.borrow().is_empty());
    }
}
