//! Error types for patch-qa-runner

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while evaluating a ticket
#[derive(Debug, Error)]
pub enum Error {
    /// Data-model error (registry, validation)
    #[error(transparent)]
    Core(#[from] patch_qa_core::Error),

    /// A checkout-contract command failed
    #[error("command failed: {command} (exit code: {exit_code}): {stderr}")]
    CommandFailed {
        /// The command that failed
        command: String,
        /// Exit code
        exit_code: i32,
        /// Captured stderr
        stderr: String,
    },

    /// No installed JDK matches the detected major version
    #[error("JDK {major} not found under {jvm_dir}")]
    ToolchainNotFound {
        /// Required Java major version
        major: u32,
        /// Directory that was searched
        jvm_dir: String,
    },

    /// Neither conventional pom.xml location exists
    #[error("pom.xml not found under {repo}")]
    BuildDescriptorMissing {
        /// Working-tree root that was searched
        repo: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toolchain_error_display() {
        let err = Error::ToolchainNotFound {
            major: 17,
            jvm_dir: "/opt/jvm".to_string(),
        };
        assert!(err.to_string().contains("JDK 17"));
        assert!(err.to_string().contains("/opt/jvm"));
    }

    #[test]
    fn test_command_failed_display() {
        let err = Error::CommandFailed {
            command: "git checkout abc".to_string(),
            exit_code: 128,
            stderr: "unknown revision".to_string(),
        };
        assert!(err.to_string().contains("git checkout abc"));
        assert!(err.to_string().contains("128"));
    }

    #[test]
    fn test_core_error_passthrough() {
        let core = patch_qa_core::Error::Validation("bad".to_string());
        let err = Error::from(core);
        assert!(err.to_string().contains("bad"));
    }
}
