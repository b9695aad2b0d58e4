//! Java toolchain selection
//!
//! The project's build descriptors carry several synonymous language-version
//! hints; the highest one wins and a matching installed JDK is resolved by
//! directory-name convention. No match is fatal before any stage runs.

use regex::Regex;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Lowest Java major version assumed when no descriptor declares one
pub const JAVA_VERSION_FLOOR: u32 = 11;

/// A resolved toolchain: the required major version and its JDK home
#[derive(Debug, Clone)]
pub struct JavaToolchain {
    /// Java major version the project compiles against
    pub major: u32,
    /// `JAVA_HOME` for that version
    pub home: PathBuf,
}

/// Locate the toolchain for a working tree
///
/// `forced_major` bypasses descriptor scanning when the caller already
/// knows the version.
///
/// # Errors
///
/// Returns [`Error::ToolchainNotFound`] when no installed JDK matches.
pub fn locate_toolchain(
    repo: &Path,
    jvm_dir: &Path,
    forced_major: Option<u32>,
) -> Result<JavaToolchain> {
    let major = forced_major.unwrap_or_else(|| detect_major(repo));
    let home = resolve_jdk(jvm_dir, major)?;
    Ok(JavaToolchain { major, home })
}

/// Highest Java version hint across every `pom.xml` in the tree
///
/// Recognized tags: `maven.compiler.release`, `maven.compiler.source`,
/// `java.version`. Unreadable descriptors are skipped.
#[must_use]
pub fn detect_major(repo: &Path) -> u32 {
    // Unwraps are safe: the patterns are compile-time constants.
    #[allow(clippy::unwrap_used)]
    let tag_patterns = [
        Regex::new(r"<maven\.compiler\.release>(\d+)").unwrap(),
        Regex::new(r"<maven\.compiler\.source>(\d+)").unwrap(),
        Regex::new(r"<java\.version>(\d+)").unwrap(),
    ];

    let mut major = JAVA_VERSION_FLOOR;
    for pom in descriptor_files(repo) {
        let Ok(text) = std::fs::read_to_string(&pom) else {
            continue;
        };
        for pattern in &tag_patterns {
            for capture in pattern.captures_iter(&text) {
                if let Ok(version) = capture[1].parse::<u32>() {
                    major = major.max(version);
                }
            }
        }
    }
    major
}

/// Resolve an installed JDK home for the given major version
///
/// Searches the JVM directory for `jdk-<major>*` directories containing
/// `bin/javac` (probed recursively when not at the conventional location).
///
/// # Errors
///
/// Returns [`Error::ToolchainNotFound`] when nothing matches.
pub fn resolve_jdk(jvm_dir: &Path, major: u32) -> Result<PathBuf> {
    let prefix = format!("jdk-{major}");
    let mut candidates: Vec<PathBuf> = std::fs::read_dir(jvm_dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| {
                    path.is_dir()
                        && path
                            .file_name()
                            .and_then(|name| name.to_str())
                            .is_some_and(|name| name.starts_with(&prefix))
                })
                .collect()
        })
        .unwrap_or_default();
    candidates.sort();

    for candidate in candidates {
        let conventional = candidate.join("bin").join("javac");
        let javac = if conventional.is_file() {
            Some(conventional)
        } else {
            find_javac(&candidate)
        };
        if let Some(javac) = javac {
            if let Some(home) = javac.parent().and_then(Path::parent) {
                return Ok(home.to_path_buf());
            }
        }
    }

    Err(Error::ToolchainNotFound {
        major,
        jvm_dir: jvm_dir.display().to_string(),
    })
}

/// Locate the build descriptor the Maven invocations are pointed at
///
/// # Errors
///
/// Returns [`Error::BuildDescriptorMissing`] when neither conventional
/// location exists.
pub fn locate_build_descriptor(repo: &Path) -> Result<PathBuf> {
    for candidate in [repo.join("java").join("pom.xml"), repo.join("pom.xml")] {
        if candidate.is_file() {
            return Ok(candidate);
        }
    }
    Err(Error::BuildDescriptorMissing {
        repo: repo.display().to_string(),
    })
}

fn descriptor_files(repo: &Path) -> Vec<PathBuf> {
    let mut poms = Vec::new();
    visit_descriptors(repo, &mut poms);
    poms.sort();
    poms
}

fn visit_descriptors(dir: &Path, poms: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            visit_descriptors(&path, poms);
        } else if path.file_name().is_some_and(|name| name == "pom.xml") {
            poms.push(path);
        }
    }
}

fn find_javac(root: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_javac(&path) {
                return Some(found);
            }
        } else if path.file_name().is_some_and(|name| name == "javac")
            && path
                .parent()
                .and_then(Path::file_name)
                .is_some_and(|name| name == "bin")
        {
            return Some(path);
        }
    }
    None
}
