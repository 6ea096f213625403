// Modcommit - Multi-module commit message generator
// Agents draft the title and one section per module; a contract validator
// and a bounded repair loop keep the result within the commit format.

pub mod artifacts;
pub mod cli;
pub mod composer;
pub mod context;
pub mod error;
pub mod exit_codes;
pub mod formatter;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod parser;
pub mod ui;
pub mod validator;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use error::{ContractError, PipelineError, Stage};
pub use models::{CommitMessageDraft, Contract, DiffContext, ModcommitConfig, ValidationResult};
pub use orchestrator::{AgentClient, AgentSpec, GenerationOutcome, Pipeline, PipelineOptions};
