use std::fmt;
use std::path::PathBuf;

/// Pipeline stage an error originated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    TopLevel,
    Module(String),
    Repair(u32),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::TopLevel => write!(f, "top-level generation"),
            Stage::Module(name) => write!(f, "module '{}' generation", name),
            Stage::Repair(attempt) => write!(f, "repair attempt {}", attempt),
        }
    }
}

/// Fatal errors that abort a generation run
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Generation cancelled")]
    Cancelled,

    #[error("Agent invocation failed during {stage}: {source:#}")]
    Agent {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    #[error("Agent invocation timed out after {secs}s during {stage}")]
    Timeout { stage: Stage, secs: u64 },
}

impl PipelineError {
    /// Stage the failure came from, if any
    pub fn stage(&self) -> Option<&Stage> {
        match self {
            PipelineError::Cancelled => None,
            PipelineError::Agent { stage, .. } | PipelineError::Timeout { stage, .. } => Some(stage),
        }
    }
}

/// Errors raised while loading or self-checking the contract
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Failed to read contract '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse contract: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Contract version '{0}' is not valid semver")]
    InvalidVersion(String),

    #[error("Contract declares version {found} but was loaded as {expected}")]
    VersionMismatch { expected: String, found: String },

    #[error("No contract found for version {version} (looked at {path})")]
    NotFound { version: String, path: PathBuf },

    #[error("Contract declares rules the validator does not implement: {}", .0.join(", "))]
    UnsupportedRules(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_stage() {
        let err = PipelineError::Timeout {
            stage: Stage::Module("docs".to_string()),
            secs: 30,
        };
        assert_eq!(
            err.to_string(),
            "Agent invocation timed out after 30s during module 'docs' generation"
        );
        assert_eq!(err.stage(), Some(&Stage::Module("docs".to_string())));

        let err = PipelineError::Agent {
            stage: Stage::Repair(1),
            source: anyhow::anyhow!("exit code 2"),
        };
        assert!(err.to_string().contains("repair attempt 1"));
        assert!(err.to_string().contains("exit code 2"));
    }

    #[test]
    fn test_unsupported_rules_lists_ids() {
        let err = ContractError::UnsupportedRules(vec!["emoji".to_string(), "gpg".to_string()]);
        assert!(err.to_string().ends_with("emoji, gpg"));
    }
}
