//! Batch-summary parsing
//!
//! The batch driver stores each ticket's captured pipeline output; these
//! parsers recover a results row from the fixed-format marker lines, the
//! per-stage summary lines and the patch-applied line.

use regex::Regex;
use std::collections::HashMap;

use crate::results::ResultRow;

fn run_line_regex() -> Regex {
    // Unwrap is safe: the pattern is a compile-time constant.
    #[allow(clippy::unwrap_used)]
    Regex::new(r"\[(base|merge|neg_patch|code_patch)\]\s+run:(\d+)\s+fail:(\d+)\s+err:(\d+)\s+skip:(\d+)")
        .unwrap()
}

fn summary_line_regex() -> Regex {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"(?m)^(base|merge|neg|code)\s*:\s*(PASS|FAIL)").unwrap()
}

fn patch_line_regex() -> Regex {
    #[allow(clippy::unwrap_used)]
    Regex::new(r"patch applied →\s*neg:\s*(True|False)\s*code:\s*(True|False)").unwrap()
}

/// Recover a results row from one ticket's captured pipeline output
///
/// Stages without a marker line keep empty cells; a missing patch-applied
/// line leaves both flags empty. Later occurrences win, matching a rerun
/// appended to the same capture.
#[must_use]
pub fn parse_transcript(ticket: &str, text: &str) -> ResultRow {
    let mut stats: HashMap<String, [String; 4]> = HashMap::new();
    for capture in run_line_regex().captures_iter(text) {
        stats.insert(
            capture[1].to_string(),
            [
                capture[2].to_string(),
                capture[3].to_string(),
                capture[4].to_string(),
                capture[5].to_string(),
            ],
        );
    }

    let mut statuses: HashMap<String, String> = HashMap::new();
    for capture in summary_line_regex().captures_iter(text) {
        statuses.insert(capture[1].to_string(), capture[2].to_string());
    }

    let (neg_applied, code_applied) = patch_line_regex()
        .captures(text)
        .map_or((String::new(), String::new()), |capture| {
            (capture[1].to_string(), capture[2].to_string())
        });

    let cell = |stage: &str, index: usize| {
        stats
            .get(stage)
            .map_or_else(String::new, |values| values[index].clone())
    };
    let status = |label: &str| statuses.get(label).cloned().unwrap_or_default();

    ResultRow {
        ticket: ticket.to_string(),
        base_tests: cell("base", 0),
        base_fail: cell("base", 1),
        base_err: cell("base", 2),
        base_skip: cell("base", 3),
        base_status: status("base"),
        merge_tests: cell("merge", 0),
        merge_fail: cell("merge", 1),
        merge_err: cell("merge", 2),
        merge_skip: cell("merge", 3),
        merge_status: status("merge"),
        neg_tests: cell("neg_patch", 0),
        neg_fail: cell("neg_patch", 1),
        neg_err: cell("neg_patch", 2),
        neg_skip: cell("neg_patch", 3),
        neg_status: status("neg"),
        code_tests: cell("code_patch", 0),
        code_fail: cell("code_patch", 1),
        code_err: cell("code_patch", 2),
        code_skip: cell("code_patch", 3),
        code_status: status("code"),
        neg_applied,
        code_applied,
    }
}
