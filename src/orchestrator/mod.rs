//! Agent invocation: the client seam, CLI-backed clients, prompts and the
//! generation pipeline that drives them

pub mod cli_agent;
pub mod cli_mapper;
pub mod model_selector;
pub mod pipeline;
pub mod prompts;
pub mod script_runner;

use crate::models::AgentRole;
use async_trait::async_trait;

pub use cli_agent::CliAgentClient;
pub use cli_mapper::{LlmArg, LlmProvider};
pub use model_selector::{ModelSelector, SelectedModel};
pub use pipeline::{
    GenerationOutcome, GenerationStatus, LoopState, Pipeline, PipelineOptions, RepairAttempt,
};
pub use script_runner::ScriptRunner;

/// What a single agent call is for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSpec {
    pub role: AgentRole,
    /// Module the call writes about (module role only)
    pub module: Option<String>,
    /// Model ID or name overriding the role's declared tier
    pub model_hint: Option<String>,
}

impl AgentSpec {
    pub fn top_level() -> Self {
        Self {
            role: AgentRole::TopLevel,
            module: None,
            model_hint: None,
        }
    }

    pub fn module(name: impl Into<String>) -> Self {
        Self {
            role: AgentRole::Module,
            module: Some(name.into()),
            model_hint: None,
        }
    }

    pub fn repair() -> Self {
        Self {
            role: AgentRole::Repair,
            module: None,
            model_hint: None,
        }
    }

    pub fn with_model_hint(mut self, hint: Option<String>) -> Self {
        self.model_hint = hint;
        self
    }
}

/// Sends one prompt to one agent and returns its raw reply
///
/// Every call is an isolated session. Implementations must be safe to call
/// concurrently; the pipeline bounds timeouts and cancellation itself.
#[async_trait]
pub trait AgentClient: Send + Sync {
    async fn invoke(&self, spec: &AgentSpec, prompt: &str) -> anyhow::Result<String>;
}
