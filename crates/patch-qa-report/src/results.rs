//! Per-ticket result rows and the merged results table
//!
//! One CSV row per ticket; cells are strings so stages that never ran stay
//! empty rather than pretending to be zero.

use patch_qa_core::{StageResult, ticket_number};
use patch_qa_runner::TicketOutcome;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// One ticket's row in the results table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    /// Ticket key
    pub ticket: String,
    /// Base stage: tests run
    pub base_tests: String,
    /// Base stage: failures
    pub base_fail: String,
    /// Base stage: errors
    pub base_err: String,
    /// Base stage: skipped
    pub base_skip: String,
    /// Base stage verdict (empty when not run)
    pub base_status: String,
    /// Merge stage: tests run
    pub merge_tests: String,
    /// Merge stage: failures
    pub merge_fail: String,
    /// Merge stage: errors
    pub merge_err: String,
    /// Merge stage: skipped
    pub merge_skip: String,
    /// Merge stage verdict (empty when not run)
    pub merge_status: String,
    /// Negative-patch stage: tests run
    pub neg_tests: String,
    /// Negative-patch stage: failures
    pub neg_fail: String,
    /// Negative-patch stage: errors
    pub neg_err: String,
    /// Negative-patch stage: skipped
    pub neg_skip: String,
    /// Negative-patch stage verdict
    pub neg_status: String,
    /// Code-patch stage: tests run
    pub code_tests: String,
    /// Code-patch stage: failures
    pub code_fail: String,
    /// Code-patch stage: errors
    pub code_err: String,
    /// Code-patch stage: skipped
    pub code_skip: String,
    /// Code-patch stage verdict
    pub code_status: String,
    /// Whether the negative patch applied cleanly (`True`/`False`)
    pub neg_applied: String,
    /// Whether the code patch applied cleanly (`True`/`False`)
    pub code_applied: String,
}

impl ResultRow {
    /// Build the row for a completed evaluation
    #[must_use]
    pub fn from_outcome(outcome: &TicketOutcome) -> Self {
        let mut row = Self {
            ticket: outcome.ticket.clone(),
            neg_applied: outcome.neg_applied.as_flag().to_string(),
            code_applied: outcome.code_applied.as_flag().to_string(),
            ..Self::default()
        };
        fill_stage(
            outcome.base.as_ref(),
            &mut row.base_tests,
            &mut row.base_fail,
            &mut row.base_err,
            &mut row.base_skip,
            &mut row.base_status,
        );
        fill_stage(
            outcome.merge.as_ref(),
            &mut row.merge_tests,
            &mut row.merge_fail,
            &mut row.merge_err,
            &mut row.merge_skip,
            &mut row.merge_status,
        );
        fill_stage(
            Some(&outcome.neg_patch),
            &mut row.neg_tests,
            &mut row.neg_fail,
            &mut row.neg_err,
            &mut row.neg_skip,
            &mut row.neg_status,
        );
        fill_stage(
            Some(&outcome.code_patch),
            &mut row.code_tests,
            &mut row.code_fail,
            &mut row.code_err,
            &mut row.code_skip,
            &mut row.code_status,
        );
        row
    }

    /// Pass-and-applied predicate used by the scorer
    #[must_use]
    pub fn counts_as_pass(&self) -> bool {
        self.code_status.trim().eq_ignore_ascii_case("PASS")
            && self.code_applied.trim().eq_ignore_ascii_case("TRUE")
            && self.neg_applied.trim().eq_ignore_ascii_case("TRUE")
    }
}

fn fill_stage(
    result: Option<&StageResult>,
    tests: &mut String,
    fail: &mut String,
    err: &mut String,
    skip: &mut String,
    status: &mut String,
) {
    // Stages that never ran keep empty cells
    let Some(result) = result else {
        return;
    };
    *tests = result.stats.run.to_string();
    *fail = result.stats.failures.to_string();
    *err = result.stats.errors.to_string();
    *skip = result.stats.skipped.to_string();
    *status = result.status().to_string();
}

/// File-name suffix for a patch-set label
fn label_suffix(label: &str) -> String {
    if label.is_empty() {
        String::new()
    } else {
        format!("__{label}")
    }
}

/// Write one ticket's row as `<results_dir>/<ticket>[__<label>].csv`
///
/// # Errors
///
/// Returns an error when the directory or file cannot be written.
pub fn write_row(results_dir: &Path, row: &ResultRow, label: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(results_dir)?;
    let path = results_dir.join(format!("{}{}.csv", row.ticket, label_suffix(label)));
    let mut writer = csv::Writer::from_path(&path)?;
    writer.serialize(row)?;
    writer.flush()?;
    Ok(path)
}

/// Read every row of a results CSV
///
/// # Errors
///
/// Returns an error when the file is unreadable or rows do not match the
/// results schema.
pub fn read_rows(path: &Path) -> Result<Vec<ResultRow>> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

/// Merge per-ticket CSVs into `test_results[__<label>].csv`
///
/// Only files belonging to the label's patch set are merged; rows are
/// sorted by the numeric ticket component, descending. Returns the number
/// of merged rows (zero when nothing matched; no file is written then).
///
/// # Errors
///
/// Returns an error when a matching file cannot be read or the merged
/// table cannot be written.
pub fn merge_results(results_dir: &Path, out_dir: &Path, label: &str) -> Result<usize> {
    let suffix = label_suffix(label);
    let merged_name = format!("test_results{suffix}.csv");

    let mut files: Vec<PathBuf> = std::fs::read_dir(results_dir)
        .map(|entries| {
            entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.extension().is_some_and(|ext| ext == "csv"))
                .collect()
        })
        .unwrap_or_default();
    files.sort();

    let mut rows = Vec::new();
    for path in files {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem == format!("test_results{suffix}") {
            continue;
        }
        if label.is_empty() && stem.contains("__") {
            continue;
        }
        if !label.is_empty() && !stem.ends_with(&suffix) {
            continue;
        }
        rows.extend(read_rows(&path)?);
    }

    if rows.is_empty() {
        return Ok(0);
    }

    rows.sort_by_key(|row| std::cmp::Reverse(ticket_number(&row.ticket)));

    std::fs::create_dir_all(out_dir)?;
    let mut writer = csv::Writer::from_path(out_dir.join(merged_name))?;
    for row in &rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}
