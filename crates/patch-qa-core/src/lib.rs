//! Patch QA Core
//!
//! Data model for the ticket evaluation pipeline: ticket records and the
//! CSV-backed registry, test identities, stage results and patch artifacts.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod error;
pub mod patch;
pub mod stage;
pub mod test_id;
pub mod ticket;

pub use error::{Error, Result};
pub use patch::{PatchOutcome, find_patch_file, negative_patch_path, resolve_code_patch};
pub use stage::{Stage, StageResult, StageStatus, TestStats};
pub use test_id::TestIdentity;
pub use ticket::{CsvTicketRegistry, TicketRecord, TicketRegistry, ticket_number};
