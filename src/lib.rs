//! patch-qa-pipeline
//!
//! Facade crate re-exporting the workspace members. The interesting code
//! lives in `patch-qa-core`, `patch-qa-runner` and `patch-qa-report`; the
//! binary is `patch-qa-cli`.

pub use patch_qa_core as model;
pub use patch_qa_report as report;
pub use patch_qa_runner as runner;
