//! Agent-agnostic CLI argument mapping
//!
//! Maps common LLM arguments to specific CLI syntax for each tool. Every
//! invocation starts a fresh session: no resume or continue flags are ever
//! emitted, so concurrent calls cannot see each other's history.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common LLM CLI arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmArg {
    /// Model name/ID
    Model(String),
    /// Reasoning level (Codex-specific, but abstracted)
    Reasoning(String),
    /// Output format (text, json, ...)
    OutputFormat(String),
    /// Print mode (Claude -p flag for non-interactive)
    Print,
    /// Tools the agent may call; empty disables tool use (Claude only)
    AllowedTools(String),
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Gemini,
    Codex,
    Claude,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

impl LlmProvider {
    /// Get the default CLI command name
    pub fn command(&self) -> &'static str {
        match self {
            LlmProvider::Gemini => "gemini",
            LlmProvider::Codex => "codex",
            LlmProvider::Claude => "claude",
        }
    }

    /// Build CLI arguments for a one-shot, prompt-on-stdin call
    pub fn build_args(&self, args: &[LlmArg]) -> Vec<String> {
        let mut cli_args = Vec::new();

        // Codex needs its non-interactive subcommand first
        if *self == LlmProvider::Codex {
            cli_args.push("exec".to_string());
        }

        for arg in args {
            match arg {
                LlmArg::Model(model) => match self {
                    LlmProvider::Gemini => {
                        cli_args.push("-m".to_string());
                        cli_args.push(model.clone());
                    }
                    LlmProvider::Codex | LlmProvider::Claude => {
                        cli_args.push("--model".to_string());
                        cli_args.push(model.clone());
                    }
                },
                LlmArg::Reasoning(level) => {
                    // Only Codex supports reasoning levels (via --config)
                    if *self == LlmProvider::Codex {
                        cli_args.push("--config".to_string());
                        cli_args.push(format!("reasoning={}", level));
                    }
                }
                LlmArg::OutputFormat(format) => match self {
                    LlmProvider::Gemini | LlmProvider::Claude => {
                        cli_args.push("--output-format".to_string());
                        cli_args.push(format.clone());
                    }
                    LlmProvider::Codex => {
                        // Codex prints plain text unless --json is given
                    }
                },
                LlmArg::Print => {
                    if *self == LlmProvider::Claude {
                        cli_args.push("-p".to_string());
                    }
                }
                LlmArg::AllowedTools(tools) => {
                    if *self == LlmProvider::Claude {
                        cli_args.push("--allowedTools".to_string());
                        cli_args.push(tools.clone());
                    }
                }
            }
        }

        cli_args
    }
}
