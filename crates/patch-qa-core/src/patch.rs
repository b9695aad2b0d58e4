//! Patch artifacts
//!
//! Diff files are immutable inputs; applying one mutates the working tree.
//! The negative patch weakens test assertions and always precedes the code
//! patch, which carries the candidate fix.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What happened when a patch was (or was not) applied
///
/// Tri-state so "no code patch supplied" is never conflated with "code
/// patch failed to apply".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatchOutcome {
    /// `git apply` exited zero
    Applied,
    /// `git apply` exited non-zero; the pipeline continued anyway
    FailedToApply,
    /// Application was never attempted
    NotAttempted,
}

impl PatchOutcome {
    /// True only for a clean application
    #[must_use]
    pub fn applied(self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Boolean rendering used by the summary line and results table
    #[must_use]
    pub fn as_flag(self) -> &'static str {
        if self.applied() { "True" } else { "False" }
    }
}

impl std::fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::FailedToApply => write!(f, "failed-to-apply"),
            Self::NotAttempted => write!(f, "not-attempted"),
        }
    }
}

/// Conventional location of a ticket's negative patch
#[must_use]
pub fn negative_patch_path(patches_neg_dir: &Path, ticket: &str) -> PathBuf {
    patches_neg_dir.join(format!("{ticket}_non_test.diff"))
}

/// Resolve a caller-supplied code patch path
///
/// An absolute existing path wins; otherwise the file name is looked up
/// under the positive-patches directory. `None` when nothing resolves.
#[must_use]
pub fn resolve_code_patch(arg: Option<&str>, patches_pos_dir: &Path) -> Option<PathBuf> {
    let candidate = Path::new(arg?);
    if candidate.is_absolute() && candidate.exists() {
        return Some(candidate.to_path_buf());
    }
    let fallback = patches_pos_dir.join(candidate.file_name()?);
    fallback.exists().then_some(fallback)
}

/// Locate a patch file for a ticket inside a directory
///
/// Search order: file names containing the full ticket key, then names
/// containing just its numeric part (so `acme__76.patch` matches `EAK-76`
/// without colliding with `EAK-176`). Accepted extensions are `.diff` and
/// `.patch`, case-insensitive; AppleDouble `._*` files are ignored. With
/// several matches the first in sorted order wins and a warning is printed.
#[must_use]
pub fn find_patch_file(ticket: &str, directory: &Path) -> Option<PathBuf> {
    let mut patterns: Vec<String> = vec![ticket.to_string()];
    if let Some(num) = numeric_part(ticket) {
        patterns.push(num);
    }

    let mut entries: Vec<PathBuf> = std::fs::read_dir(directory)
        .ok()?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_patch_extension(path) && !is_apple_double(path))
        .collect();
    entries.sort();

    let mut matches: Vec<&PathBuf> = Vec::new();
    for pattern in &patterns {
        for path in &entries {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.contains(pattern.as_str()) && !matches.contains(&path) {
                matches.push(path);
            }
        }
    }

    if matches.len() > 1 {
        eprintln!(
            "warning: {ticket}: multiple patches found, using {}",
            matches[0].display()
        );
    }
    matches.first().map(|path| (*path).clone())
}

fn numeric_part(ticket: &str) -> Option<String> {
    // Unwrap is safe: the pattern is a compile-time constant.
    #[allow(clippy::unwrap_used)]
    let digits = Regex::new(r"\d+").unwrap();
    digits.find(ticket).map(|m| m.as_str().to_string())
}

fn has_patch_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            ext == "diff" || ext == "patch"
        })
}

fn is_apple_double(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with("._"))
}
