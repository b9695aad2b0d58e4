//! Surefire report parsing
//!
//! Converts the build tool's XML report tree into aggregate statistics and
//! the set of red tests. Individual files that fail to parse are skipped:
//! crash-truncated reports are routine after killed test runs and must not
//! abort the batch.

use patch_qa_core::{TestIdentity, TestStats};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Sum `tests`/`failures`/`errors`/`skipped` across every parseable report
/// file under the subtree
///
/// A missing root directory yields all-zero statistics, not an error.
#[must_use]
pub fn aggregate_statistics(root: &Path) -> TestStats {
    let mut total = TestStats::default();
    for report in report_files(root) {
        if let Some(stats) = parse_statistics(&report) {
            total.absorb(stats);
        }
    }
    total
}

/// Collect the identity of every test case carrying a failure or error
/// marker anywhere under the subtree
#[must_use]
pub fn collect_red_tests(root: &Path) -> BTreeSet<TestIdentity> {
    let mut red = BTreeSet::new();
    for report in report_files(root) {
        collect_red_from_file(&report, &mut red);
    }
    red
}

/// Every `*.xml` file directly inside a `target/surefire-reports`
/// directory under the subtree, in sorted order
fn report_files(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    visit(root, &mut files);
    files.sort();
    files
}

fn visit(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        if is_report_dir(&path) {
            collect_xml_files(&path, files);
        } else {
            visit(&path, files);
        }
    }
}

fn is_report_dir(path: &Path) -> bool {
    path.file_name().is_some_and(|name| name == "surefire-reports")
        && path
            .parent()
            .and_then(Path::file_name)
            .is_some_and(|name| name == "target")
}

fn collect_xml_files(dir: &Path, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "xml") {
            files.push(path);
        }
    }
}

fn parse_statistics(report: &Path) -> Option<TestStats> {
    let text = std::fs::read_to_string(report).ok()?;
    let doc = roxmltree::Document::parse(&text).ok()?;
    let root = doc.root_element();

    let attr = |name: &str| {
        root.attribute(name)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(0)
    };

    Some(TestStats {
        run: attr("tests"),
        failures: attr("failures"),
        errors: attr("errors"),
        skipped: attr("skipped"),
    })
}

fn collect_red_from_file(report: &Path, red: &mut BTreeSet<TestIdentity>) {
    let Ok(text) = std::fs::read_to_string(report) else {
        return;
    };
    let Ok(doc) = roxmltree::Document::parse(&text) else {
        return;
    };

    for case in doc
        .descendants()
        .filter(|node| node.has_tag_name("testcase"))
    {
        let failed = case
            .children()
            .any(|child| child.has_tag_name("failure") || child.has_tag_name("error"));
        if !failed {
            continue;
        }
        let (Some(classname), Some(name)) = (case.attribute("classname"), case.attribute("name"))
        else {
            continue;
        };
        red.insert(TestIdentity::from_report(classname, name));
    }
}
