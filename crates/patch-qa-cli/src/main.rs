//! Patch QA CLI
//!
//! Command-line interface for the ticket evaluation pipeline.

#![allow(clippy::doc_markdown)]

use clap::{Parser, Subcommand};
use patch_qa_cli::{collect_results, resolve_config, run_batch, run_ticket, score_folder};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "patch-qa")]
#[command(about = "Four-stage test evaluation for Java patch candidates", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one ticket: base, merge, neg_patch and code_patch stages
    Run {
        /// Ticket key (must be registered in the ticket registry)
        #[arg(value_name = "TICKET")]
        ticket: String,

        /// Optional code-patch diff, resolved under the positive-patches
        /// directory when not an absolute path
        #[arg(value_name = "PATCH")]
        patch: Option<String>,

        /// Skip base+merge and reuse the skip list stored in the registry
        #[arg(long)]
        fast: bool,

        /// Root of the benchmark project (defaults to the current directory)
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Pipeline configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,

        /// Force a Java major version instead of scanning build descriptors
        #[arg(long, value_name = "N")]
        java_major: Option<u32>,
    },

    /// Evaluate every registered ticket and merge the results table
    Batch {
        /// Directory of patches; with --fast a directory of patch sets
        #[arg(long)]
        patches_dir: Option<PathBuf>,

        /// Reuse stored skip lists instead of re-running base+merge
        #[arg(long)]
        fast: bool,

        /// Root of the benchmark project (defaults to the current directory)
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Pipeline configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,

        /// Force a Java major version instead of scanning build descriptors
        #[arg(long, value_name = "N")]
        java_major: Option<u32>,
    },

    /// Rebuild the merged results table from captured summary logs
    Collect {
        /// Patch-set label (empty for the default set)
        #[arg(long, default_value = "")]
        label: String,

        /// Root of the benchmark project (defaults to the current directory)
        #[arg(long)]
        project_root: Option<PathBuf>,

        /// Pipeline configuration YAML
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Rank every test_results*.csv in a folder by pass-and-applied rate
    Score {
        /// Folder holding merged results tables
        #[arg(value_name = "FOLDER")]
        folder: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Run {
            ticket,
            patch,
            fast,
            project_root,
            config,
            java_major,
        } => resolve_config(config.as_deref(), project_root.as_deref()).and_then(|config| {
            // Stage failures are reported through the summary, not the
            // exit code; only fatal taxonomy errors reach the Err arm.
            run_ticket(&config, &ticket, patch.as_deref(), fast, java_major).map(|_| ())
        }),

        Commands::Batch {
            patches_dir,
            fast,
            project_root,
            config,
            java_major,
        } => resolve_config(config.as_deref(), project_root.as_deref()).and_then(|config| {
            run_batch(&config, patches_dir.as_deref(), fast, java_major).map(|evaluated| {
                println!("evaluated {evaluated} tickets");
            })
        }),

        Commands::Collect {
            label,
            project_root,
            config,
        } => resolve_config(config.as_deref(), project_root.as_deref()).and_then(|config| {
            collect_results(&config, &label).map(|collected| {
                println!("collected {collected} tickets");
            })
        }),

        Commands::Score { folder } => score_folder(&folder).map(|rendered| {
            print!("{rendered}");
        }),
    };

    if let Err(e) = outcome {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
