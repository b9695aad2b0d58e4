//! Pipeline orchestration
//!
//! Sequences the four stages for one ticket. Full mode runs base and merge
//! first to reconcile the skip list; fast mode reuses the persisted skip
//! list and jumps straight to the patch stages.

use chrono::{DateTime, Utc};
use patch_qa_core::{
    PatchOutcome, Stage, StageResult, StageStatus, TicketRegistry, negative_patch_path,
    resolve_code_patch,
};
use serde::{Deserialize, Serialize};

use crate::command::CommandRunner;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::skiplist;
use crate::stage::{StageRunner, marker_line};
use crate::surefire;
use crate::toolchain::{locate_build_descriptor, locate_toolchain};
use crate::workspace::Workspace;

/// Consolidated outcome of one ticket's evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketOutcome {
    /// Ticket key
    pub ticket: String,
    /// Whether base/merge were skipped in favor of a stored skip list
    pub fast_mode: bool,
    /// Base stage result (absent in fast mode)
    pub base: Option<StageResult>,
    /// Merge stage result (absent in fast mode)
    pub merge: Option<StageResult>,
    /// Merge + negative patch stage result
    pub neg_patch: StageResult,
    /// Merge + negative + code patch stage result
    pub code_patch: StageResult,
    /// What happened to the negative patch
    pub neg_applied: PatchOutcome,
    /// What happened to the code patch
    pub code_applied: PatchOutcome,
    /// When the evaluation finished
    pub timestamp: DateTime<Utc>,
    /// Host the evaluation ran on
    pub host: String,
}

impl TicketOutcome {
    /// A ticket passes iff its final stage passed and both patches applied
    #[must_use]
    pub fn passed(&self) -> bool {
        self.code_patch.status() == StageStatus::Pass
            && self.neg_applied.applied()
            && self.code_applied.applied()
    }

    /// The human-scannable summary block printed after the last stage
    #[must_use]
    pub fn render_summary(&self) -> String {
        let mut out = String::from("\nSummary\n");
        out.push_str(&summary_line("base", self.base.as_ref()));
        out.push_str(&summary_line("merge", self.merge.as_ref()));
        out.push_str(&summary_line("neg", Some(&self.neg_patch)));
        out.push_str(&summary_line("code", Some(&self.code_patch)));
        out.push_str(&format!(
            "patch applied → neg: {} code: {}\n",
            self.neg_applied.as_flag(),
            self.code_applied.as_flag()
        ));
        out
    }

    /// Marker lines plus summary block, as captured by the batch driver
    #[must_use]
    pub fn render_transcript(&self) -> String {
        let mut out = String::new();
        for result in [
            self.base.as_ref(),
            self.merge.as_ref(),
            Some(&self.neg_patch),
            Some(&self.code_patch),
        ]
        .into_iter()
        .flatten()
        {
            out.push_str(&marker_line(result));
            out.push('\n');
        }
        out.push_str(&self.render_summary());
        out
    }
}

fn summary_line(label: &str, result: Option<&StageResult>) -> String {
    match result {
        Some(result) => format!("{label:<5}: {}  {}\n", result.status(), result.stats),
        None => format!("{label:<5}: SKIP  run=0 fail=0 err=0 skip=0\n"),
    }
}

/// Orchestrates one ticket's four-stage evaluation
pub struct Pipeline<'a> {
    runner: &'a dyn CommandRunner,
    registry: &'a dyn TicketRegistry,
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    /// Create a pipeline over the given seams
    #[must_use]
    pub fn new(
        runner: &'a dyn CommandRunner,
        registry: &'a dyn TicketRegistry,
        config: &'a PipelineConfig,
    ) -> Self {
        Self {
            runner,
            registry,
            config,
        }
    }

    /// Evaluate one ticket
    ///
    /// Full mode (`fast == false`) runs base and merge, reconciles and
    /// persists the skip list, then runs the two patch stages. Fast mode
    /// loads the stored skip list and runs only the patch stages.
    ///
    /// # Errors
    ///
    /// Fatal conditions only: unknown ticket, missing build descriptor,
    /// no matching JDK, missing skip list in fast mode, checkout failure,
    /// unwritable log artifacts. Stage failures are data in the outcome.
    pub fn evaluate(
        &self,
        ticket: &str,
        code_patch: Option<&str>,
        fast: bool,
        forced_java: Option<u32>,
    ) -> Result<TicketOutcome> {
        let repo = self.config.repo_dir();
        let workspace = Workspace::new(&repo);

        let pom = locate_build_descriptor(&repo)?;
        let toolchain = locate_toolchain(&repo, &self.config.jvm_dir_path(), forced_java)?;
        println!("Java {} -> {}", toolchain.major, toolchain.home.display());

        let record = self.registry.get(ticket)?;

        let stage_runner = StageRunner::new(
            self.runner,
            &workspace,
            pom,
            toolchain.home,
            self.config.log_dir_path(),
            ticket,
        );

        let (base, merge, skip) = if fast {
            let skip = skiplist::load(self.registry, ticket)?;
            println!("loaded {} tests to skip for {ticket}", skip.len());
            (None, None, skip)
        } else {
            workspace.checkout(self.runner, &record.before_commit)?;
            let base_result = stage_runner.run(Stage::Base, None)?;
            let base_red = surefire::collect_red_tests(workspace.root());

            workspace.checkout(self.runner, &record.merge_commit)?;
            let merge_result = stage_runner.run(Stage::Merge, None)?;
            let merge_red = surefire::collect_red_tests(workspace.root());

            let skip = skiplist::compute(&base_red, &merge_red);
            skiplist::persist(self.registry, ticket, &skip)?;
            (Some(base_result), Some(merge_result), skip)
        };

        let filter = skiplist::build_filter(&skip);

        // Patch stages always run against the merge revision
        workspace.checkout(self.runner, &record.merge_commit)?;

        let neg_path = negative_patch_path(&self.config.patches_neg_dir(), ticket);
        let neg_applied = workspace.apply_patch(self.runner, &neg_path);
        let neg_result = stage_runner.run(Stage::NegPatch, filter.as_deref())?;

        let code_applied = if neg_applied.applied() {
            match resolve_code_patch(code_patch, &self.config.patches_pos_dir()) {
                Some(path) => workspace.apply_patch(self.runner, &path),
                None => PatchOutcome::NotAttempted,
            }
        } else {
            PatchOutcome::NotAttempted
        };
        let code_result = stage_runner.run(Stage::CodePatch, filter.as_deref())?;

        Ok(TicketOutcome {
            ticket: ticket.to_string(),
            fast_mode: fast,
            base,
            merge,
            neg_patch: neg_result,
            code_patch: code_result,
            neg_applied,
            code_applied,
            timestamp: Utc::now(),
            host: hostname::get()
                .map_or_else(|_| "unknown".to_string(), |h| h.to_string_lossy().to_string()),
        })
    }
}
