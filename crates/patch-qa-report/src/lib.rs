//! Patch QA Report
//!
//! Merges per-ticket outcomes into a results dataset and computes the
//! pass-and-applied rate against a known denominator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod results;
pub mod score;
pub mod summary;

pub use error::{Error, Result};
pub use results::{ResultRow, merge_results, read_rows, write_row};
pub use score::{ExpectedTotals, pass_and_applied_rate, rank_results, render_ranking};
pub use summary::parse_transcript;
