//! The checked-out working tree
//!
//! The tree is an exclusively-owned mutable resource for the duration of
//! one ticket's pipeline. Every revision switch goes through the reset
//! contract so a patch applied in one stage never leaks into the next.

use patch_qa_core::PatchOutcome;
use std::path::{Path, PathBuf};

use crate::command::CommandRunner;
use crate::error::{Error, Result};

/// Handle to the working tree under evaluation
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Wrap an existing checkout
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root of the working tree
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Switch the tree to a revision
    ///
    /// Contract: discard uncommitted changes and untracked files first
    /// (`reset --hard`, `clean -fd`), then check out the revision.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CommandFailed`] when any of the three git commands
    /// exits non-zero; a tree in an unknown state is unusable.
    pub fn checkout(&self, runner: &dyn CommandRunner, reference: &str) -> Result<()> {
        let steps: [&[&str]; 3] = [
            &["reset", "--hard"],
            &["clean", "-fd"],
            &["checkout", reference],
        ];
        for args in steps {
            let output = runner.git(&self.root, args);
            if !output.success {
                return Err(Error::CommandFailed {
                    command: format!("git {}", args.join(" ")),
                    exit_code: output.exit_code,
                    stderr: output.stderr,
                });
            }
        }
        Ok(())
    }

    /// Apply a diff to the tree, best-effort
    ///
    /// A non-zero exit is an outcome, not an error: the pipeline keeps
    /// going to observe the unpatched behavior.
    #[must_use]
    pub fn apply_patch(&self, runner: &dyn CommandRunner, patch: &Path) -> PatchOutcome {
        let patch_arg = patch.display().to_string();
        let output = runner.git(
            &self.root,
            &["apply", "--ignore-whitespace", patch_arg.as_str()],
        );
        if output.success {
            PatchOutcome::Applied
        } else {
            PatchOutcome::FailedToApply
        }
    }

    /// Delete every `target` directory under the tree
    ///
    /// Idempotent; nothing to delete is not an error.
    pub fn clean_build_output(&self) {
        remove_target_dirs(&self.root);
    }
}

fn remove_target_dirs(dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if path.file_name().is_some_and(|name| name == "target") {
            let _ = std::fs::remove_dir_all(&path);
        } else {
            remove_target_dirs(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::MockCommandRunner;
    use std::fs;

    #[test]
    fn test_checkout_contract_order() {
        let mock = MockCommandRunner::new();
        let workspace = Workspace::new("/tmp/repo");

        workspace.checkout(&mock, "abc123").expect("checkout");

        assert_eq!(
            mock.invocations(),
            ["git reset --hard", "git clean -fd", "git checkout abc123"]
        );
    }

    #[test]
    fn test_checkout_failure_is_error() {
        let mock = MockCommandRunner::new().with_checkout_exit(128);
        let workspace = Workspace::new("/tmp/repo");

        let err = workspace.checkout(&mock, "abc123").expect_err("failure");
        assert!(matches!(err, Error::CommandFailed { exit_code: 128, .. }));
    }

    #[test]
    fn test_apply_patch_outcomes() {
        let mock = MockCommandRunner::new().with_failing_patch("broken.diff");
        let workspace = Workspace::new("/tmp/repo");

        let ok = workspace.apply_patch(&mock, Path::new("/patches/good.diff"));
        assert_eq!(ok, PatchOutcome::Applied);

        let bad = workspace.apply_patch(&mock, Path::new("/patches/broken.diff"));
        assert_eq!(bad, PatchOutcome::FailedToApply);
    }

    #[test]
    fn test_clean_build_output() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("module-a").join("target").join("classes");
        fs::create_dir_all(&target).expect("create target");
        fs::write(target.join("Foo.class"), "").expect("write class");
        let source = dir.path().join("module-a").join("src");
        fs::create_dir_all(&source).expect("create src");

        let workspace = Workspace::new(dir.path());
        workspace.clean_build_output();

        assert!(!dir.path().join("module-a").join("target").exists());
        assert!(source.exists());
    }

    #[test]
    fn test_clean_build_output_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let workspace = Workspace::new(dir.path());
        workspace.clean_build_output();
        workspace.clean_build_output();
    }

    #[test]
    fn test_clean_missing_root_is_noop() {
        let workspace = Workspace::new("/nonexistent/tree");
        workspace.clean_build_output();
    }
}
