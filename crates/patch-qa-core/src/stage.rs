//! Pipeline stages and per-stage test statistics

use serde::{Deserialize, Serialize};

/// One of the four pipeline phases
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Unmodified base revision
    Base,
    /// Clean merge revision
    Merge,
    /// Merge plus the negative patch
    NegPatch,
    /// Merge plus negative and code patches
    CodePatch,
}

impl Stage {
    /// Stage name used in marker lines and log file names
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Merge => "merge",
            Self::NegPatch => "neg_patch",
            Self::CodePatch => "code_patch",
        }
    }

    /// Short label used in the printed summary block
    #[must_use]
    pub fn summary_label(self) -> &'static str {
        match self {
            Self::Base => "base",
            Self::Merge => "merge",
            Self::NegPatch => "neg",
            Self::CodePatch => "code",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Aggregated surefire counts for one build+test execution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestStats {
    /// Tests executed
    pub run: u64,
    /// Assertion failures
    pub failures: u64,
    /// Errors (crashes, setup problems)
    pub errors: u64,
    /// Tests skipped by the framework
    pub skipped: u64,
}

impl TestStats {
    /// Elementwise accumulation of another report's counts
    pub fn absorb(&mut self, other: Self) {
        self.run += other.run;
        self.failures += other.failures;
        self.errors += other.errors;
        self.skipped += other.skipped;
    }

    /// True when every counter is zero
    #[must_use]
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl std::fmt::Display for TestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "run={} fail={} err={} skip={}",
            self.run, self.failures, self.errors, self.skipped
        )
    }
}

/// Verdict derived from a stage's exit status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    /// Exit status zero
    Pass,
    /// Non-zero exit status
    Fail,
    /// Stage not executed (fast-mode placeholder)
    Skip,
}

impl std::fmt::Display for StageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "PASS"),
            Self::Fail => write!(f, "FAIL"),
            Self::Skip => write!(f, "SKIP"),
        }
    }
}

/// Outcome of one build+test execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// Which pipeline phase produced this result
    pub stage: Stage,
    /// Exit status of the failing step, or zero
    pub exit_code: i32,
    /// Aggregated report statistics
    pub stats: TestStats,
}

impl StageResult {
    /// Create a stage result
    #[must_use]
    pub fn new(stage: Stage, exit_code: i32, stats: TestStats) -> Self {
        Self {
            stage,
            exit_code,
            stats,
        }
    }

    /// PASS when the stage exited cleanly, FAIL otherwise
    #[must_use]
    pub fn status(&self) -> StageStatus {
        if self.exit_code == 0 {
            StageStatus::Pass
        } else {
            StageStatus::Fail
        }
    }
}
