//! Command execution abstraction for testability
//!
//! A trait-based seam over the two subprocess families the pipeline drives
//! (git and Maven), so the orchestrator can be exercised with a mock.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Mutex;

/// Result of executing a command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit code (negative for signals)
    pub exit_code: i32,
    /// Whether the command succeeded
    pub success: bool,
}

impl CommandOutput {
    /// Create a successful command output
    #[must_use]
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
            success: true,
        }
    }

    /// Create a failed command output
    #[must_use]
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code,
            success: false,
        }
    }
}

/// Trait for executing the pipeline's subprocesses
///
/// Every invocation blocks until the subprocess terminates; the pipeline
/// enforces no timeouts of its own.
pub trait CommandRunner: Send + Sync {
    /// Execute a git subcommand inside the working tree
    fn git(&self, repo: &Path, args: &[&str]) -> CommandOutput;

    /// Execute a Maven invocation inside the working tree
    ///
    /// `java_home` selects the resolved toolchain: it is exported as
    /// `JAVA_HOME` and its `bin` directory is prepended to `PATH`.
    fn maven(&self, repo: &Path, args: &[String], java_home: &Path) -> CommandOutput;
}

/// Real command runner that spawns actual subprocesses
#[derive(Debug, Clone)]
pub struct RealCommandRunner {
    /// Path to the git binary (default: "git")
    pub git_binary: String,
    /// Path to the mvn binary (default: "mvn")
    pub mvn_binary: String,
}

impl Default for RealCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl RealCommandRunner {
    /// Create a runner using binaries from `PATH`
    #[must_use]
    pub fn new() -> Self {
        Self {
            git_binary: "git".to_string(),
            mvn_binary: "mvn".to_string(),
        }
    }

    fn capture(output: std::io::Result<std::process::Output>) -> CommandOutput {
        match output {
            Ok(output) => CommandOutput {
                stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                exit_code: output.status.code().unwrap_or(-1),
                success: output.status.success(),
            },
            Err(e) => CommandOutput::failure(-1, format!("failed to execute command: {e}")),
        }
    }
}

impl CommandRunner for RealCommandRunner {
    fn git(&self, repo: &Path, args: &[&str]) -> CommandOutput {
        use std::process::Command;

        Self::capture(Command::new(&self.git_binary).args(args).current_dir(repo).output())
    }

    fn maven(&self, repo: &Path, args: &[String], java_home: &Path) -> CommandOutput {
        use std::process::Command;

        let mut paths = vec![java_home.join("bin")];
        if let Some(existing) = std::env::var_os("PATH") {
            paths.extend(std::env::split_paths(&existing));
        }
        let path_value = std::env::join_paths(paths)
            .unwrap_or_else(|_| java_home.join("bin").into_os_string());

        Self::capture(
            Command::new(&self.mvn_binary)
                .args(args)
                .current_dir(repo)
                .env("JAVA_HOME", java_home)
                .env("PATH", path_value)
                .output(),
        )
    }
}

/// Scripted test run the mock replays on each Maven `test` invocation
type ScriptedTestRun = (i32, Vec<(String, String)>);

/// Mock command runner for testing
///
/// Records every invocation and replays scripted exit codes. Each scripted
/// test run may carry surefire report files that are materialized under
/// `target/surefire-reports` in the working tree, emulating the build tool.
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    install_exits: Mutex<VecDeque<i32>>,
    test_runs: Mutex<VecDeque<ScriptedTestRun>>,
    failing_patches: Vec<String>,
    checkout_exit: i32,
    invocations: Mutex<Vec<String>>,
}

impl MockCommandRunner {
    /// Create a mock where every command succeeds and produces no reports
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an exit code for the next Maven install invocation
    #[must_use]
    pub fn with_install_exit(self, exit_code: i32) -> Self {
        self.install_exits
            .lock()
            .expect("mock poisoned")
            .push_back(exit_code);
        self
    }

    /// Queue a Maven test invocation: its exit code plus the surefire
    /// report files (name, xml) it leaves behind
    #[must_use]
    pub fn with_test_run(self, exit_code: i32, reports: &[(&str, &str)]) -> Self {
        self.test_runs.lock().expect("mock poisoned").push_back((
            exit_code,
            reports
                .iter()
                .map(|(name, xml)| ((*name).to_string(), (*xml).to_string()))
                .collect(),
        ));
        self
    }

    /// Make `git apply` fail for any patch path containing the fragment
    #[must_use]
    pub fn with_failing_patch(mut self, path_fragment: impl Into<String>) -> Self {
        self.failing_patches.push(path_fragment.into());
        self
    }

    /// Make checkout-contract commands fail with the given exit code
    #[must_use]
    pub fn with_checkout_exit(mut self, exit_code: i32) -> Self {
        self.checkout_exit = exit_code;
        self
    }

    /// Every command line seen so far, in order
    #[must_use]
    pub fn invocations(&self) -> Vec<String> {
        self.invocations.lock().expect("mock poisoned").clone()
    }

    fn record(&self, line: String) {
        self.invocations.lock().expect("mock poisoned").push(line);
    }
}

impl CommandRunner for MockCommandRunner {
    fn git(&self, _repo: &Path, args: &[&str]) -> CommandOutput {
        self.record(format!("git {}", args.join(" ")));

        if args.first() == Some(&"apply") {
            let failing = args
                .iter()
                .any(|arg| self.failing_patches.iter().any(|frag| arg.contains(frag)));
            return if failing {
                CommandOutput::failure(1, "patch does not apply")
            } else {
                CommandOutput::success("")
            };
        }

        if self.checkout_exit != 0 {
            CommandOutput::failure(self.checkout_exit, "checkout failed")
        } else {
            CommandOutput::success("")
        }
    }

    fn maven(&self, repo: &Path, args: &[String], _java_home: &Path) -> CommandOutput {
        self.record(format!("mvn {}", args.join(" ")));

        if args.iter().any(|arg| arg == "install") {
            let exit = self
                .install_exits
                .lock()
                .expect("mock poisoned")
                .pop_front()
                .unwrap_or(0);
            return if exit == 0 {
                CommandOutput::success("BUILD SUCCESS")
            } else {
                CommandOutput::failure(exit, "BUILD FAILURE")
            };
        }

        let (exit, reports) = self
            .test_runs
            .lock()
            .expect("mock poisoned")
            .pop_front()
            .unwrap_or((0, Vec::new()));

        let report_dir = repo.join("target").join("surefire-reports");
        for (name, xml) in reports {
            if std::fs::create_dir_all(&report_dir).is_ok() {
                let _ = std::fs::write(report_dir.join(name), xml);
            }
        }

        if exit == 0 {
            CommandOutput::success("BUILD SUCCESS")
        } else {
            CommandOutput::failure(exit, "BUILD FAILURE")
        }
    }
}
