use super::model_selector::{ModelSelector, SelectedModel};
use super::script_runner::ScriptRunner;
use super::{AgentClient, AgentSpec};
use crate::models::{AgentDeclaration, AgentRole, ModcommitConfig};
use anyhow::Result;
use async_trait::async_trait;

/// [`AgentClient`] that shells out to the configured provider CLIs
///
/// Declared models are resolved once at construction, so a misconfigured
/// role fails before any agent runs. A per-call model hint is resolved
/// against the same provider when the call is made.
#[derive(Debug, Clone)]
pub struct CliAgentClient {
    config: ModcommitConfig,
    top_level: SelectedModel,
    module: SelectedModel,
    repair: SelectedModel,
    runner: ScriptRunner,
}

impl CliAgentClient {
    pub fn new(config: &ModcommitConfig) -> Result<Self> {
        let selector = ModelSelector::new(config);
        Ok(Self {
            config: config.clone(),
            top_level: selector.for_role(AgentRole::TopLevel)?,
            module: selector.for_role(AgentRole::Module)?,
            repair: selector.for_role(AgentRole::Repair)?,
            runner: ScriptRunner::new(),
        })
    }

    pub fn model_for(&self, role: AgentRole) -> &SelectedModel {
        match role {
            AgentRole::TopLevel => &self.top_level,
            AgentRole::Module => &self.module,
            AgentRole::Repair => &self.repair,
        }
    }
}

#[async_trait]
impl AgentClient for CliAgentClient {
    async fn invoke(&self, spec: &AgentSpec, prompt: &str) -> Result<String> {
        let hinted;
        let selected = match &spec.model_hint {
            Some(hint) => {
                let declaration = AgentDeclaration {
                    model: Some(hint.clone()),
                    ..self.config.agents.for_role(spec.role).clone()
                };
                hinted = ModelSelector::new(&self.config).resolve(&declaration)?;
                &hinted
            }
            None => self.model_for(spec.role),
        };
        tracing::info!(
            role = spec.role.name(),
            module = spec.module.as_deref().unwrap_or("-"),
            provider = %selected.provider,
            model = %selected.model,
            "invoking agent"
        );
        self.runner
            .run(&selected.command, &selected.cli_args(), prompt)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::LlmProvider;

    #[test]
    fn test_models_resolved_per_role() {
        let mut config = ModcommitConfig::default();
        config.agents.module.provider = LlmProvider::Gemini;
        let client = CliAgentClient::new(&config).unwrap();
        assert_eq!(client.model_for(AgentRole::Module).command, "gemini");
        assert_eq!(client.model_for(AgentRole::Repair).model, "opus");
    }

    #[test]
    fn test_unknown_model_fails_construction() {
        let mut config = ModcommitConfig::default();
        config.agents.top_level.model = Some("nonexistent".to_string());
        assert!(CliAgentClient::new(&config).is_err());
    }
}
