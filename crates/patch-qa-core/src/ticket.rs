//! Ticket records and the CSV-backed ticket registry
//!
//! The registry is the source of truth for which tickets exist. Reads of an
//! unknown ticket and writes against an unregistered ticket are both hard
//! errors so results are never silently orphaned.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One unit of candidate change under evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Unique ticket key (e.g. `EAK-76`)
    pub ticket: String,
    /// Revision before the candidate change
    pub before_commit: String,
    /// Revision after the candidate change was merged
    pub merge_commit: String,
    /// Persisted skip-list cell, `ClassName#methodName` tokens
    pub skipped_tests: Option<String>,
}

/// Typed repository over the ticket store
pub trait TicketRegistry {
    /// Look up one ticket; unknown keys are an error
    ///
    /// # Errors
    ///
    /// Returns [`Error::TicketNotFound`] when the key has no row.
    fn get(&self, ticket: &str) -> Result<TicketRecord>;

    /// All ticket keys in registry order
    ///
    /// # Errors
    ///
    /// Returns an error when the store cannot be read.
    fn tickets(&self) -> Result<Vec<String>>;

    /// Replace the ticket's skip-list cell wholesale
    ///
    /// # Errors
    ///
    /// Returns [`Error::TicketNotFound`] when the ticket is not a
    /// pre-registered row.
    fn update_skipped_tests(&self, ticket: &str, tokens: &str) -> Result<()>;
}

/// CSV file registry with header `ticket,before_commit,merge_commit`
/// and an optional `skipped_tests` column created on first write
#[derive(Debug, Clone)]
pub struct CsvTicketRegistry {
    path: PathBuf,
}

const REQUIRED_COLUMNS: [&str; 3] = ["ticket", "before_commit", "merge_commit"];
const SKIPPED_COLUMN: &str = "skipped_tests";

impl CsvTicketRegistry {
    /// Open a registry at the given path (read lazily per operation)
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<Vec<TicketRecord>> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let headers = reader.headers()?.clone();
        let column = |name: &str| headers.iter().position(|h| h.trim() == name);

        for required in REQUIRED_COLUMNS {
            if column(required).is_none() {
                return Err(Error::Registry(format!(
                    "{} is missing required column '{required}'",
                    self.path.display()
                )));
            }
        }

        let ticket_col = column("ticket").unwrap_or(0);
        let before_col = column("before_commit").unwrap_or(1);
        let merge_col = column("merge_commit").unwrap_or(2);
        let skipped_col = column(SKIPPED_COLUMN);

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let field = |i: usize| record.get(i).unwrap_or("").trim().to_string();
            let ticket = field(ticket_col);
            if ticket.is_empty() {
                continue;
            }
            rows.push(TicketRecord {
                ticket,
                before_commit: field(before_col),
                merge_commit: field(merge_col),
                skipped_tests: skipped_col.map(|i| field(i)).filter(|s| !s.is_empty()),
            });
        }
        Ok(rows)
    }

    fn write_all(&self, rows: &[TicketRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(&self.path)?;
        writer.write_record(["ticket", "before_commit", "merge_commit", SKIPPED_COLUMN])?;
        for row in rows {
            writer.write_record([
                row.ticket.as_str(),
                row.before_commit.as_str(),
                row.merge_commit.as_str(),
                row.skipped_tests.as_deref().unwrap_or(""),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn not_found(&self, ticket: &str) -> Error {
        Error::TicketNotFound {
            ticket: ticket.to_string(),
            registry: self.path.display().to_string(),
        }
    }
}

impl TicketRegistry for CsvTicketRegistry {
    fn get(&self, ticket: &str) -> Result<TicketRecord> {
        self.read_all()?
            .into_iter()
            .find(|row| row.ticket == ticket)
            .ok_or_else(|| self.not_found(ticket))
    }

    fn tickets(&self) -> Result<Vec<String>> {
        Ok(self.read_all()?.into_iter().map(|row| row.ticket).collect())
    }

    fn update_skipped_tests(&self, ticket: &str, tokens: &str) -> Result<()> {
        let mut rows = self.read_all()?;
        let row = rows
            .iter_mut()
            .find(|row| row.ticket == ticket)
            .ok_or_else(|| self.not_found(ticket))?;
        row.skipped_tests = if tokens.is_empty() {
            None
        } else {
            Some(tokens.to_string())
        };
        self.write_all(&rows)
    }
}

/// Numeric component of a ticket key, used for result ordering
///
/// Returns -1 when the key carries no digits, sorting such keys last.
#[must_use]
pub fn ticket_number(key: &str) -> i64 {
    let digits: String = key
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(-1)
}
