//! Patch QA CLI
//!
//! Command implementations behind the `patch-qa` binary: evaluate one
//! ticket, drive the batch loop, rebuild results from captured summaries
//! and rank result tables.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

use std::path::{Path, PathBuf};

use patch_qa_core::{CsvTicketRegistry, TicketRegistry, find_patch_file};
use patch_qa_report::{
    ExpectedTotals, ResultRow, merge_results, parse_transcript, rank_results, render_ranking,
    write_row,
};
use patch_qa_runner::{CommandRunner, Pipeline, PipelineConfig, RealCommandRunner, TicketOutcome};

/// Boxed error for command-level failures
pub type CliError = Box<dyn std::error::Error>;
/// Result type alias for command implementations
pub type CliResult<T> = Result<T, CliError>;

/// Resolve the effective configuration for a command
///
/// An explicit config file wins; otherwise the conventional layout is
/// rooted at the project root (default: current directory).
///
/// # Errors
///
/// Returns an error when the config file is unreadable or malformed.
pub fn resolve_config(
    config_file: Option<&Path>,
    project_root: Option<&Path>,
) -> CliResult<PipelineConfig> {
    let mut config = match config_file {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(root) = project_root {
        config.project_root = root.to_path_buf();
    }
    Ok(config)
}

/// Evaluate one ticket and print its summary block
///
/// Stage failures are not errors: the summary carries the verdicts and the
/// process still exits 0.
///
/// # Errors
///
/// Returns an error only for fatal conditions (unknown ticket, missing
/// toolchain or build descriptor, missing skip list in fast mode).
pub fn run_ticket(
    config: &PipelineConfig,
    ticket: &str,
    code_patch: Option<&str>,
    fast: bool,
    java_major: Option<u32>,
) -> CliResult<TicketOutcome> {
    let registry = CsvTicketRegistry::new(config.registry_path());
    let runner = RealCommandRunner::new();
    let outcome = evaluate_with(&runner, &registry, config, ticket, code_patch, fast, java_major)?;
    print!("{}", outcome.render_summary());
    Ok(outcome)
}

/// Evaluate one ticket over explicit seams (the testable core of `run`)
///
/// # Errors
///
/// Propagates the pipeline's fatal errors.
pub fn evaluate_with(
    runner: &dyn CommandRunner,
    registry: &dyn TicketRegistry,
    config: &PipelineConfig,
    ticket: &str,
    code_patch: Option<&str>,
    fast: bool,
    java_major: Option<u32>,
) -> CliResult<TicketOutcome> {
    let pipeline = Pipeline::new(runner, registry, config);
    Ok(pipeline.evaluate(ticket, code_patch, fast, java_major)?)
}

/// Run every registry ticket against one or more patch sets
///
/// The thin batch loop: per-ticket fatal errors are reported and skipped,
/// never aborting the remaining tickets. After each patch set the
/// per-ticket rows are merged into `test_results[__<set>].csv` at the
/// project root.
///
/// # Errors
///
/// Returns an error when the registry or the patch-set layout is unusable.
pub fn run_batch(
    config: &PipelineConfig,
    patches_dir: Option<&Path>,
    fast: bool,
    java_major: Option<u32>,
) -> CliResult<usize> {
    let registry = CsvTicketRegistry::new(config.registry_path());
    let runner = RealCommandRunner::new();
    run_batch_with(&runner, &registry, config, patches_dir, fast, java_major)
}

/// Batch loop over explicit seams (the testable core of `batch`)
///
/// # Errors
///
/// Returns an error when the registry or the patch-set layout is unusable.
pub fn run_batch_with(
    runner: &dyn CommandRunner,
    registry: &dyn TicketRegistry,
    config: &PipelineConfig,
    patches_dir: Option<&Path>,
    fast: bool,
    java_major: Option<u32>,
) -> CliResult<usize> {
    let patch_sets = resolve_patch_sets(config, patches_dir, fast)?;
    let tickets = registry.tickets()?;
    let results_dir = config.results_dir_path();
    let log_dir = config.summary_log_dir();
    std::fs::create_dir_all(&log_dir)?;

    let mut evaluated = 0;
    for patch_set in &patch_sets {
        let label = if patch_sets.len() > 1 {
            patch_set
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string()
        } else {
            String::new()
        };
        let suffix = if label.is_empty() {
            String::new()
        } else {
            format!("__{label}")
        };

        for ticket in &tickets {
            let Some(patch) = locate_ticket_patch(ticket, patch_set, fast) else {
                continue;
            };

            println!("{ticket} ({})", if fast { "fast" } else { "full" });
            let patch_arg = patch.display().to_string();
            match evaluate_with(
                runner,
                registry,
                config,
                ticket,
                Some(&patch_arg),
                fast,
                java_major,
            ) {
                Ok(outcome) => {
                    let transcript = outcome.render_transcript();
                    print!("{}", outcome.render_summary());
                    std::fs::write(log_dir.join(format!("{ticket}{suffix}.txt")), transcript)?;
                    write_row(&results_dir, &ResultRow::from_outcome(&outcome), &label)?;
                    evaluated += 1;
                }
                Err(e) => {
                    eprintln!("{ticket}: {e}");
                }
            }
        }

        let merged = merge_results(&results_dir, &config.project_root, &label)?;
        if merged == 0 {
            println!("no results for patch set '{}'", display_label(&label));
        } else {
            println!("merged {merged} rows -> test_results{suffix}.csv");
        }
    }
    Ok(evaluated)
}

/// Rebuild the merged results table from captured summary logs
///
/// Parses every `results/logs/*.txt` for the label's patch set, writes the
/// recovered per-ticket rows and re-merges them. Used to recover a
/// `test_results.csv` after a crashed batch run.
///
/// # Errors
///
/// Returns an error when the logs directory is unreadable or the rows
/// cannot be written.
pub fn collect_results(config: &PipelineConfig, label: &str) -> CliResult<usize> {
    let log_dir = config.summary_log_dir();
    let results_dir = config.results_dir_path();
    let suffix = if label.is_empty() {
        String::new()
    } else {
        format!("__{label}")
    };

    let mut files: Vec<PathBuf> = std::fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "txt"))
        .collect();
    files.sort();

    let mut collected = 0;
    for path in files {
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        let ticket = match (label.is_empty(), stem.strip_suffix(suffix.as_str())) {
            (true, _) if stem.contains("__") => continue,
            (true, _) => stem,
            (false, Some(ticket)) => ticket,
            (false, None) => continue,
        };
        let text = std::fs::read_to_string(&path)?;
        write_row(&results_dir, &parse_transcript(ticket, &text), label)?;
        collected += 1;
    }

    merge_results(&results_dir, &config.project_root, label)?;
    Ok(collected)
}

/// Score and rank every results table in a folder
///
/// # Errors
///
/// Returns an error when the folder cannot be read.
pub fn score_folder(folder: &Path) -> CliResult<String> {
    let ranked = rank_results(folder, &ExpectedTotals::benchmark_defaults())?;
    Ok(render_ranking(&ranked))
}

/// The patch directories the batch iterates over
///
/// Full mode uses the configured positive-patches directory. Fast mode
/// requires an explicit directory; when that directory holds no patch
/// files itself, each immediate child directory is an independent patch
/// set.
fn resolve_patch_sets(
    config: &PipelineConfig,
    patches_dir: Option<&Path>,
    fast: bool,
) -> CliResult<Vec<PathBuf>> {
    if !fast {
        return Ok(vec![patches_dir
            .map_or_else(|| config.patches_pos_dir(), Path::to_path_buf)]);
    }

    let dir = patches_dir.ok_or("--patches-dir is required with --fast")?;
    let dir = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        config.project_root.join(dir)
    };

    if has_patch_files(&dir) {
        return Ok(vec![dir]);
    }

    let mut sets: Vec<PathBuf> = std::fs::read_dir(&dir)?
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    sets.sort();
    if sets.is_empty() {
        return Err(format!("no patch files or subdirectories found in {}", dir.display()).into());
    }
    Ok(sets)
}

fn has_patch_files(dir: &Path) -> bool {
    std::fs::read_dir(dir).is_ok_and(|entries| {
        entries.flatten().any(|entry| {
            let path = entry.path();
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| {
                        let ext = ext.to_ascii_lowercase();
                        ext == "diff" || ext == "patch"
                    })
        })
    })
}

/// Locate the patch the batch passes for one ticket
///
/// Fast mode searches by ticket key with a numeric fallback. Full mode
/// uses the `<ticket>_non_test.diff` convention and additionally requires
/// a non-empty `<ticket>_test.diff` sibling: a ticket without a test patch
/// is legitimately excluded upstream.
fn locate_ticket_patch(ticket: &str, patch_set: &Path, fast: bool) -> Option<PathBuf> {
    if fast {
        let found = find_patch_file(ticket, patch_set);
        if found.is_none() {
            println!("{ticket}: patch not found in {}", patch_set.display());
        }
        return found;
    }

    let test_patch = patch_set.join(format!("{ticket}_test.diff"));
    let usable = test_patch.metadata().is_ok_and(|meta| meta.len() > 0);
    if !usable {
        println!("{ticket}: test patch missing/empty - skipping");
        return None;
    }

    let patch = patch_set.join(format!("{ticket}_non_test.diff"));
    if !patch.exists() {
        println!("{ticket}: patch not found in {}", patch_set.display());
        return None;
    }
    Some(patch)
}

fn display_label(label: &str) -> &str {
    if label.is_empty() { "default" } else { label }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_resolve_config_defaults() {
        let config = resolve_config(None, Some(Path::new("/bench"))).expect("config");
        assert_eq!(config.project_root, PathBuf::from("/bench"));
        assert_eq!(config.repo, "repo");
    }

    #[test]
    fn test_resolve_config_file_with_root_override() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("pipeline.yaml");
        fs::write(&path, "repo: edmb-backend\n").expect("write config");

        let config =
            resolve_config(Some(&path), Some(Path::new("/bench"))).expect("config");
        assert_eq!(config.repo_dir(), PathBuf::from("/bench/edmb-backend"));
    }

    #[test]
    fn test_resolve_patch_sets_full_mode_default() {
        let config = PipelineConfig::with_project_root("/bench");
        let sets = resolve_patch_sets(&config, None, false).expect("sets");
        assert_eq!(sets, vec![PathBuf::from("/bench/patches_pos")]);
    }

    #[test]
    fn test_resolve_patch_sets_fast_requires_dir() {
        let config = PipelineConfig::with_project_root("/bench");
        assert!(resolve_patch_sets(&config, None, true).is_err());
    }

    #[test]
    fn test_resolve_patch_sets_fast_flat_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("EAK-76.diff"), "x").expect("write");

        let config = PipelineConfig::with_project_root("/bench");
        let sets = resolve_patch_sets(&config, Some(dir.path()), true).expect("sets");
        assert_eq!(sets, vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn test_resolve_patch_sets_fast_nested_sets() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("model-b")).expect("mkdir");
        fs::create_dir(dir.path().join("model-a")).expect("mkdir");

        let config = PipelineConfig::with_project_root("/bench");
        let sets = resolve_patch_sets(&config, Some(dir.path()), true).expect("sets");
        assert_eq!(sets.len(), 2);
        assert!(sets[0].ends_with("model-a"));
    }

    #[test]
    fn test_resolve_patch_sets_fast_empty_dir_is_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = PipelineConfig::with_project_root("/bench");
        assert!(resolve_patch_sets(&config, Some(dir.path()), true).is_err());
    }

    #[test]
    fn test_locate_ticket_patch_full_mode_requires_test_patch() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("EAK-76_non_test.diff"), "x").expect("write");

        // No test patch → excluded
        assert!(locate_ticket_patch("EAK-76", dir.path(), false).is_none());

        // Empty test patch → still excluded
        fs::write(dir.path().join("EAK-76_test.diff"), "").expect("write");
        assert!(locate_ticket_patch("EAK-76", dir.path(), false).is_none());

        // Non-empty test patch → usable
        fs::write(dir.path().join("EAK-76_test.diff"), "diff").expect("write");
        let patch = locate_ticket_patch("EAK-76", dir.path(), false).expect("patch");
        assert!(patch.ends_with("EAK-76_non_test.diff"));
    }

    #[test]
    fn test_locate_ticket_patch_fast_mode_discovery() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("model_fix_76.patch"), "x").expect("write");

        let patch = locate_ticket_patch("EAK-76", dir.path(), true).expect("patch");
        assert!(patch.ends_with("model_fix_76.patch"));
    }

    #[test]
    fn test_score_folder_renders_ranking() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut writer =
            csv::Writer::from_path(dir.path().join("test_results-CF-CLASSIC.csv"))
                .expect("writer");
        for _ in 0..5 {
            writer
                .serialize(ResultRow {
                    ticket: "CF-1".to_string(),
                    code_status: "PASS".to_string(),
                    code_applied: "True".to_string(),
                    neg_applied: "True".to_string(),
                    ..ResultRow::default()
                })
                .expect("serialize");
        }
        writer.flush().expect("flush");

        let rendered = score_folder(dir.path()).expect("score");
        assert!(rendered.contains("CF-CLASSIC"));
        assert!(rendered.contains("50.0%"));
    }
}
