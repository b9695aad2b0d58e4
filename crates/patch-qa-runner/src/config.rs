//! Pipeline configuration
//!
//! All paths hang off a single project root; every entry has a
//! conventional default so a bare root is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Directory layout and file locations for one benchmark project
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Root directory everything else is resolved against
    pub project_root: PathBuf,
    /// Working-tree checkout of the Java project, relative to the root
    pub repo: String,
    /// Directory of negative patches
    pub patches_neg: String,
    /// Directory of positive (code) patches
    pub patches_pos: String,
    /// Ticket registry CSV
    pub registry: String,
    /// Maven log artifacts
    pub log_dir: String,
    /// Installed JDKs
    pub jvm_dir: String,
    /// Per-ticket result CSVs and captured summaries
    pub results_dir: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            project_root: PathBuf::from("."),
            repo: "repo".to_string(),
            patches_neg: "patches_neg".to_string(),
            patches_pos: "patches_pos".to_string(),
            registry: "pr_states.csv".to_string(),
            log_dir: "mvn-logs".to_string(),
            jvm_dir: "jvm".to_string(),
            results_dir: "results".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Configuration rooted at the given directory, all defaults
    #[must_use]
    pub fn with_project_root(root: impl Into<PathBuf>) -> Self {
        Self {
            project_root: root.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from YAML text
    ///
    /// # Errors
    ///
    /// Returns an error when the YAML does not deserialize.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load a configuration file
    ///
    /// # Errors
    ///
    /// Returns an error when the file is unreadable or malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    /// The Java working tree
    #[must_use]
    pub fn repo_dir(&self) -> PathBuf {
        self.project_root.join(&self.repo)
    }

    /// The negative-patches directory
    #[must_use]
    pub fn patches_neg_dir(&self) -> PathBuf {
        self.project_root.join(&self.patches_neg)
    }

    /// The positive-patches directory
    #[must_use]
    pub fn patches_pos_dir(&self) -> PathBuf {
        self.project_root.join(&self.patches_pos)
    }

    /// The ticket registry CSV
    #[must_use]
    pub fn registry_path(&self) -> PathBuf {
        self.project_root.join(&self.registry)
    }

    /// The Maven log directory
    #[must_use]
    pub fn log_dir_path(&self) -> PathBuf {
        self.project_root.join(&self.log_dir)
    }

    /// The installed-JDKs directory
    #[must_use]
    pub fn jvm_dir_path(&self) -> PathBuf {
        self.project_root.join(&self.jvm_dir)
    }

    /// The results directory
    #[must_use]
    pub fn results_dir_path(&self) -> PathBuf {
        self.project_root.join(&self.results_dir)
    }

    /// Where batch runs keep each ticket's captured summary text
    #[must_use]
    pub fn summary_log_dir(&self) -> PathBuf {
        self.results_dir_path().join("logs")
    }
}
