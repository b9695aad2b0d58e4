//! Pass-rate scoring
//!
//! A ticket counts as a pass iff its final stage passed and both patches
//! applied. The denominator is a fixed, dataset-specific expected total,
//! not the observed row count: some tickets are legitimately excluded
//! upstream and row-count shrinkage must not inflate the rate.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::results::{ResultRow, read_rows};

/// Dataset-specific expected ticket totals
///
/// Keys are matched as case-insensitive substrings of the dataset name, in
/// insertion order; the `classic` table applies when the name contains
/// `CLASSIC`, the `tdd` table otherwise.
#[derive(Debug, Clone)]
pub struct ExpectedTotals {
    classic: Vec<(String, usize)>,
    tdd: Vec<(String, usize)>,
}

impl ExpectedTotals {
    /// Build a totals map from explicit tables
    #[must_use]
    pub fn new(classic: Vec<(String, usize)>, tdd: Vec<(String, usize)>) -> Self {
        Self { classic, tdd }
    }

    /// The benchmark's hand-maintained totals
    #[must_use]
    pub fn benchmark_defaults() -> Self {
        let table = |entries: &[(&str, usize)]| {
            entries
                .iter()
                .map(|(key, total)| ((*key).to_string(), *total))
                .collect()
        };
        Self {
            classic: table(&[("CF", 10), ("DMB", 3), ("EAK", 20)]),
            tdd: table(&[("CF", 53), ("DMB", 43), ("EAK", 51)]),
        }
    }

    /// Expected total for a dataset, falling back to the observed count
    /// when no key matches
    #[must_use]
    pub fn expected_for(&self, dataset: &str, observed: usize) -> usize {
        let name = dataset.to_uppercase();
        let table = if name.contains("CLASSIC") {
            &self.classic
        } else {
            &self.tdd
        };
        table
            .iter()
            .find(|(key, _)| name.contains(key.as_str()))
            .map_or(observed, |(_, total)| *total)
    }
}

impl Default for ExpectedTotals {
    fn default() -> Self {
        Self::benchmark_defaults()
    }
}

/// Pass-and-applied rate for one results table
///
/// `None` when the table is empty or the denominator resolves to zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn pass_and_applied_rate(
    rows: &[ResultRow],
    dataset: &str,
    totals: &ExpectedTotals,
) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    let passes = rows.iter().filter(|row| row.counts_as_pass()).count();
    let total = totals.expected_for(dataset, rows.len());
    if total == 0 {
        return None;
    }
    Some(passes as f64 / total as f64)
}

/// Score every `test_results*.csv` in a folder
///
/// Unreadable or schema-mismatched files are skipped with a note on
/// stderr. Results are sorted by rate descending, then name ascending.
///
/// # Errors
///
/// Returns an error when the folder itself cannot be read.
pub fn rank_results(folder: &Path, totals: &ExpectedTotals) -> Result<Vec<(String, f64)>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension().is_some_and(|ext| ext == "csv")
                && path
                    .file_stem()
                    .and_then(|stem| stem.to_str())
                    .is_some_and(|stem| stem.starts_with("test_results"))
        })
        .collect();
    files.sort();

    let mut ranked = Vec::new();
    for path in files {
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        let rows = match read_rows(&path) {
            Ok(rows) => rows,
            Err(e) => {
                eprintln!("skipping {}: {e}", path.display());
                continue;
            }
        };
        match pass_and_applied_rate(&rows, &stem, totals) {
            Some(rate) => ranked.push((display_name(&stem), rate)),
            None => eprintln!("skipping {}: empty file", path.display()),
        }
    }

    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    Ok(ranked)
}

/// Render the ranking with percentages aligned in one column
#[must_use]
pub fn render_ranking(ranked: &[(String, f64)]) -> String {
    let width = ranked.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for (name, rate) in ranked {
        let percent = format!("{:.1}%", rate * 100.0);
        out.push_str(&format!("{name:<width$}  {percent:>6}\n"));
    }
    out
}

/// Strip the conventional results-table prefix for display
fn display_name(stem: &str) -> String {
    stem.strip_prefix("test_results-")
        .or_else(|| stem.strip_prefix("test_results__"))
        .or_else(|| stem.strip_prefix("test_results"))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(stem)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(code_status: &str, code_applied: &str, neg_applied: &str) -> ResultRow {
        ResultRow {
            ticket: "T-1".to_string(),
            code_status: code_status.to_string(),
            code_applied: code_applied.to_string(),
            neg_applied: neg_applied.to_string(),
            ..ResultRow::default()
        }
    }

    fn passing() -> ResultRow {
        row("PASS", "True", "True")
    }

    #[test]
    fn test_rate_uses_expected_total_not_row_count() {
        // 8 rows, 5 passing, dataset expected total 10 → 50.0%, not 62.5%
        let mut rows: Vec<ResultRow> = (0..5).map(|_| passing()).collect();
        rows.extend((0..3).map(|_| row("FAIL", "True", "True")));

        let totals = ExpectedTotals::benchmark_defaults();
        let rate = pass_and_applied_rate(&rows, "test_results-CF-CLASSIC", &totals)
            .expect("rate");
        assert!((rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rate_falls_back_to_row_count() {
        let rows = vec![passing(), row("FAIL", "True", "True")];
        let totals = ExpectedTotals::benchmark_defaults();
        let rate = pass_and_applied_rate(&rows, "unknown-dataset", &totals).expect("rate");
        assert!((rate - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rate_classic_vs_tdd_tables() {
        let rows = vec![passing()];
        let totals = ExpectedTotals::benchmark_defaults();

        let classic = pass_and_applied_rate(&rows, "CF-CLASSIC", &totals).expect("rate");
        assert!((classic - 0.1).abs() < f64::EPSILON);

        let tdd = pass_and_applied_rate(&rows, "CF-agent", &totals).expect("rate");
        assert!((tdd - 1.0 / 53.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rate_empty_rows_is_none() {
        let totals = ExpectedTotals::benchmark_defaults();
        assert!(pass_and_applied_rate(&[], "CF", &totals).is_none());
    }

    #[test]
    fn test_rate_requires_all_three_conditions() {
        let totals = ExpectedTotals::new(vec![], vec![("X".to_string(), 4)]);
        let rows = vec![
            passing(),
            row("PASS", "False", "True"),
            row("PASS", "True", "False"),
            row("FAIL", "True", "True"),
        ];
        let rate = pass_and_applied_rate(&rows, "X", &totals).expect("rate");
        assert!((rate - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_expected_for_first_matching_key_wins() {
        let totals = ExpectedTotals::new(
            vec![("CF".to_string(), 10), ("C".to_string(), 99)],
            vec![],
        );
        assert_eq!(totals.expected_for("CF-CLASSIC", 1), 10);
    }

    #[test]
    fn test_rank_results_sorted_descending() {
        let dir = tempfile::tempdir().expect("tempdir");
        let totals = ExpectedTotals::new(vec![], vec![("SET".to_string(), 2)]);

        let write = |name: &str, rows: &[ResultRow]| {
            let mut writer =
                csv::Writer::from_path(dir.path().join(name)).expect("writer");
            for row in rows {
                writer.serialize(row).expect("serialize");
            }
            writer.flush().expect("flush");
        };
        write("test_results-SET-a.csv", &[passing(), passing()]);
        write("test_results-SET-b.csv", &[passing(), row("FAIL", "True", "True")]);

        let ranked = rank_results(dir.path(), &totals).expect("rank");
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].0, "SET-a");
        assert!((ranked[0].1 - 1.0).abs() < f64::EPSILON);
        assert_eq!(ranked[1].0, "SET-b");
    }

    #[test]
    fn test_rank_results_skips_malformed_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("test_results-bad.csv"), "not,a,results\n1,2,3\n")
            .expect("write");

        let ranked =
            rank_results(dir.path(), &ExpectedTotals::benchmark_defaults()).expect("rank");
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_rank_results_ignores_other_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("notes.csv"), "a,b\n1,2\n").expect("write");

        let ranked =
            rank_results(dir.path(), &ExpectedTotals::benchmark_defaults()).expect("rank");
        assert!(ranked.is_empty());
    }

    #[test]
    fn test_render_ranking_alignment() {
        let ranked = vec![
            ("SET-long-name".to_string(), 0.872),
            ("SET-b".to_string(), 0.5),
        ];
        let rendered = render_ranking(&ranked);
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("87.2%"));
        assert!(lines[1].ends_with("50.0%"));
        // Percent columns start at the same offset
        let offset = |line: &str| line.find('%').expect("percent");
        assert_eq!(offset(lines[0]), offset(lines[1]));
    }

    #[test]
    fn test_display_name_strips_prefix() {
        assert_eq!(display_name("test_results-CF-CLASSIC"), "CF-CLASSIC");
        assert_eq!(display_name("test_results__gpt4"), "gpt4");
        assert_eq!(display_name("test_results"), "test_results");
    }
}
