//! Generation pipeline: fan-out to agents, combine, normalize, validate,
//! repair
//!
//! ```text
//! Generated -> Validated -> Accepted
//!                  |  ^
//!                  v  |
//!               Repairing      (budget spent -> Exhausted)
//! ```

use super::{prompts, AgentClient, AgentSpec};
use crate::artifacts::{ArtifactSink, NoopSink};
use crate::composer::combine;
use crate::context::{build_module_contexts, build_module_payload, build_top_level_payload};
use crate::error::{ContractError, PipelineError, Stage};
use crate::exit_codes;
use crate::formatter::{NormalizeOptions, Normalizer};
use crate::models::{
    AgentResponse, AgentRole, CommitMessageDraft, Contract, DiffContext, ValidationResult,
    WorkflowConfig,
};
use crate::parser::{sanitize_response, SanitizeOptions};
use crate::validator::ContractValidator;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Repair attempts after the first validation
    pub repair_iterations: u32,
    /// Upper bound for one agent invocation
    pub agent_timeout: Duration,
    /// Agent invocations in flight at once
    pub max_concurrency: usize,
    /// Diff characters embedded in one prompt
    pub max_diff_chars: usize,
    /// Per-role model overrides passed through to the client
    pub model_hints: HashMap<AgentRole, String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&WorkflowConfig::default())
    }
}

impl PipelineOptions {
    pub fn from_config(workflow: &WorkflowConfig) -> Self {
        Self {
            repair_iterations: workflow.repair_iterations,
            agent_timeout: Duration::from_secs(workflow.agent_timeout_secs),
            max_concurrency: workflow.max_concurrency,
            max_diff_chars: workflow.max_diff_chars,
            model_hints: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Generated,
    Validated,
    Repairing,
    Accepted,
    Exhausted,
}

/// The most recent repair round
#[derive(Debug, Clone)]
pub struct RepairAttempt {
    /// 1-based attempt number
    pub iteration: u32,
    pub prompt: String,
    pub raw_text: String,
    pub sanitized: String,
    pub result: ValidationResult,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStatus {
    /// No error-severity violations remain
    Accepted,
    /// Repair budget spent with errors outstanding
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    /// Normalized message text
    pub message: String,
    pub draft: CommitMessageDraft,
    /// Validation of `message`
    pub result: ValidationResult,
    /// Repair attempts made
    pub attempts: u32,
    pub last_attempt: Option<RepairAttempt>,
    pub status: GenerationStatus,
}

impl GenerationOutcome {
    pub fn exit_code(&self) -> i32 {
        if self.result.is_valid() {
            exit_codes::OK
        } else {
            exit_codes::UNRESOLVED_ERRORS
        }
    }
}

pub struct Pipeline {
    client: Arc<dyn AgentClient>,
    contract: Contract,
    validator: ContractValidator,
    normalizer: Normalizer,
    sanitize_options: SanitizeOptions,
    options: PipelineOptions,
    sink: Arc<dyn ArtifactSink>,
    cancel: CancellationToken,
}

impl Pipeline {
    /// Fails when the contract names rules the validator lacks
    pub fn new(
        client: Arc<dyn AgentClient>,
        contract: Contract,
        options: PipelineOptions,
    ) -> Result<Self, ContractError> {
        let validator = ContractValidator::new(&contract)?;
        Ok(Self {
            client,
            normalizer: Normalizer::new(NormalizeOptions::from_contract(&contract)),
            sanitize_options: SanitizeOptions::from_contract(&contract),
            validator,
            contract,
            options,
            sink: Arc::new(NoopSink),
            cancel: CancellationToken::new(),
        })
    }

    pub fn with_sink(mut self, sink: Arc<dyn ArtifactSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    /// Generate, validate and repair a commit message for `ctx`
    pub async fn run(&self, ctx: &DiffContext) -> Result<GenerationOutcome, PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let multi_module = ctx.is_multi_module();
        let top_payload = build_top_level_payload(ctx, self.options.max_diff_chars);
        let top_prompt = prompts::top_level_prompt(&self.contract, multi_module, &top_payload);
        self.sink.record("prompt-top-level.md", &top_prompt);

        let mut jobs = vec![(Stage::TopLevel, self.spec(AgentSpec::top_level()), top_prompt.clone())];
        for module in build_module_contexts(ctx) {
            let payload = build_module_payload(&module, self.options.max_diff_chars);
            let prompt = prompts::module_prompt(&self.contract, &module.module_name, &payload);
            self.sink
                .record(&format!("prompt-module-{}.md", module.module_name), &prompt);
            jobs.push((
                Stage::Module(module.module_name.clone()),
                self.spec(AgentSpec::module(&module.module_name)),
                prompt,
            ));
        }

        tracing::info!(
            modules = ctx.affected_modules.len(),
            calls = jobs.len(),
            "dispatching agents"
        );
        let replies: Vec<Result<String, PipelineError>> = stream::iter(
            jobs.iter()
                .map(|(stage, spec, prompt)| self.invoke(stage.clone(), spec, prompt)),
        )
        .buffered(self.options.max_concurrency.max(1))
        .collect()
        .await;

        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        let replies = replies.into_iter().collect::<Result<Vec<String>, _>>()?;

        let mut texts = jobs.iter().zip(replies).map(|((stage, spec, _), raw)| {
            self.sink.record(&format!("raw-{}.md", artifact_label(stage)), &raw);
            let response = AgentResponse {
                role: spec.role,
                raw_text: raw,
            };
            let text = sanitize_response(response, &self.sanitize_options);
            self.sink
                .record(&format!("sanitized-{}.md", artifact_label(stage)), &text);
            (spec.module.clone(), text)
        });
        let top_text = texts.next().map(|(_, text)| text).unwrap_or_default();
        let module_texts: Vec<(String, String)> = texts
            .filter_map(|(module, text)| module.map(|m| (m, text)))
            .collect();

        let mut state = LoopState::Generated;
        let mut draft = combine(ctx, &top_text, &module_texts);
        let mut message = self.normalizer.normalize(&draft.render());
        let mut result = self.validator.validate(&message, &ctx.affected_modules);
        self.record_round("generated", &message, &result);
        let mut attempts = 0u32;
        let mut last_attempt: Option<RepairAttempt> = None;

        loop {
            state = match state {
                LoopState::Generated => LoopState::Validated,
                LoopState::Validated if result.is_valid() => LoopState::Accepted,
                LoopState::Validated if attempts < self.options.repair_iterations => {
                    LoopState::Repairing
                }
                LoopState::Validated => LoopState::Exhausted,
                LoopState::Repairing => {
                    attempts += 1;
                    let prompt = prompts::repair_prompt(
                        &top_prompt,
                        &message,
                        &result,
                        &ctx.affected_modules,
                    );
                    tracing::info!(
                        attempt = attempts,
                        errors = result.blocking().len(),
                        "repairing message"
                    );
                    self.sink.record(&format!("prompt-repair-{}.md", attempts), &prompt);

                    let raw = self
                        .invoke(Stage::Repair(attempts), &self.spec(AgentSpec::repair()), &prompt)
                        .await?;
                    self.sink.record(&format!("raw-repair-{}.md", attempts), &raw);
                    let response = AgentResponse {
                        role: AgentRole::Repair,
                        raw_text: raw.clone(),
                    };
                    let sanitized = sanitize_response(response, &self.sanitize_options);

                    draft = combine(ctx, &sanitized, &[]);
                    message = self.normalizer.normalize(&draft.render());
                    result = self.validator.validate(&message, &ctx.affected_modules);
                    self.record_round(&format!("repair-{}", attempts), &message, &result);

                    last_attempt = Some(RepairAttempt {
                        iteration: attempts,
                        prompt,
                        raw_text: raw,
                        sanitized,
                        result: result.clone(),
                    });
                    LoopState::Validated
                }
                LoopState::Accepted | LoopState::Exhausted => break,
            };
            tracing::debug!(?state, attempts, "repair loop transition");
        }

        let status = if state == LoopState::Accepted {
            GenerationStatus::Accepted
        } else {
            tracing::warn!(
                attempts,
                errors = result.blocking().len(),
                "repair budget exhausted with errors outstanding"
            );
            GenerationStatus::Exhausted
        };

        Ok(GenerationOutcome {
            message,
            draft,
            result,
            attempts,
            last_attempt,
            status,
        })
    }

    fn spec(&self, spec: AgentSpec) -> AgentSpec {
        let hint = self.options.model_hints.get(&spec.role).cloned();
        spec.with_model_hint(hint)
    }

    /// One bounded, cancellable agent call
    async fn invoke(&self, stage: Stage, spec: &AgentSpec, prompt: &str) -> Result<String, PipelineError> {
        if self.cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let timeout = self.options.agent_timeout;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(PipelineError::Cancelled),
            reply = tokio::time::timeout(timeout, self.client.invoke(spec, prompt)) => match reply {
                Ok(Ok(text)) => Ok(text),
                Ok(Err(source)) => {
                    tracing::error!(%stage, error = %source, "agent invocation failed");
                    Err(PipelineError::Agent { stage, source })
                }
                Err(_) => {
                    tracing::error!(%stage, secs = timeout.as_secs(), "agent invocation timed out");
                    Err(PipelineError::Timeout {
                        stage,
                        secs: timeout.as_secs(),
                    })
                }
            },
        }
    }

    fn record_round(&self, label: &str, message: &str, result: &ValidationResult) {
        self.sink.record(&format!("message-{}.md", label), message);
        self.sink
            .record(&format!("validation-{}.txt", label), &result.format_errors());
    }
}

fn artifact_label(stage: &Stage) -> String {
    match stage {
        Stage::TopLevel => "top-level".to_string(),
        Stage::Module(name) => format!("module-{}", name),
        Stage::Repair(n) => format!("repair-{}", n),
    }
}
