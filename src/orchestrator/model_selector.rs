use super::cli_mapper::{LlmArg, LlmProvider};
use crate::models::{AgentDeclaration, AgentRole, ModcommitConfig};
use anyhow::{Context, Result};

/// Concrete CLI invocation target for one role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedModel {
    pub provider: LlmProvider,
    /// Executable to spawn (from config, defaults to the provider name)
    pub command: String,
    pub model: String,
    /// Reasoning level (Codex only)
    pub reasoning: Option<String>,
}

impl SelectedModel {
    /// CLI arguments for a one-shot, text-output call
    pub fn cli_args(&self) -> Vec<String> {
        let mut args = vec![
            LlmArg::Print,
            LlmArg::Model(self.model.clone()),
            LlmArg::AllowedTools(String::new()),
            LlmArg::OutputFormat("text".to_string()),
        ];
        if let Some(level) = &self.reasoning {
            args.push(LlmArg::Reasoning(level.clone()));
        }
        self.provider.build_args(&args)
    }
}

/// Model selector for choosing appropriate models based on role tier
pub struct ModelSelector<'a> {
    config: &'a ModcommitConfig,
}

impl<'a> ModelSelector<'a> {
    pub fn new(config: &'a ModcommitConfig) -> Self {
        Self { config }
    }

    /// Model for the agent declared for `role`
    pub fn for_role(&self, role: AgentRole) -> Result<SelectedModel> {
        self.resolve(self.config.agents.for_role(role))
            .with_context(|| format!("No model configured for the {} agent", role.name()))
    }

    /// Explicit model hint first, then tier selection, then the provider default
    pub fn resolve(&self, declaration: &AgentDeclaration) -> Result<SelectedModel> {
        let provider = self.config.provider(declaration.provider);
        let model_config = match (&declaration.model, declaration.tier) {
            (Some(hint), _) => provider.find_model(hint).with_context(|| {
                format!("Model '{}' is not configured for {}", hint, declaration.provider)
            })?,
            (None, Some(tier)) => provider
                .select_model(tier)
                .with_context(|| format!("{} has no models configured", declaration.provider))?,
            (None, None) => provider
                .default_model()
                .with_context(|| format!("{} has no models configured", declaration.provider))?,
        };

        Ok(SelectedModel {
            provider: declaration.provider,
            command: provider.command.clone(),
            model: model_config.model.clone(),
            reasoning: model_config.reasoning.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelTier;

    fn declared(provider: LlmProvider, tier: Option<ModelTier>) -> AgentDeclaration {
        AgentDeclaration {
            provider,
            tier,
            model: None,
        }
    }

    #[test]
    fn test_model_selection_by_tier() {
        let config = ModcommitConfig::default();
        let selector = ModelSelector::new(&config);

        let claude = selector.resolve(&declared(LlmProvider::Claude, Some(ModelTier::Light))).unwrap();
        assert_eq!(claude.model, "haiku");
        assert_eq!(claude.command, "claude");

        // Gemini has no light model, the cheapest stronger one serves
        let gemini = selector.resolve(&declared(LlmProvider::Gemini, Some(ModelTier::Light))).unwrap();
        assert!(gemini.model.contains("flash"));

        let codex = selector.resolve(&declared(LlmProvider::Codex, Some(ModelTier::Strong))).unwrap();
        assert_eq!(codex.reasoning, Some("high".to_string()));
    }

    #[test]
    fn test_role_defaults() {
        let config = ModcommitConfig::default();
        let selector = ModelSelector::new(&config);
        assert_eq!(selector.for_role(AgentRole::Module).unwrap().model, "haiku");
        assert_eq!(selector.for_role(AgentRole::TopLevel).unwrap().model, "sonnet");
        assert_eq!(selector.for_role(AgentRole::Repair).unwrap().model, "opus");
    }

    #[test]
    fn test_untiered_declaration_uses_provider_default() {
        let mut config = ModcommitConfig::default();
        config.agents.top_level = declared(LlmProvider::Gemini, None);
        config.gemini.default = "pro".to_string();
        let selector = ModelSelector::new(&config);
        let selected = selector.for_role(AgentRole::TopLevel).unwrap();
        assert_eq!(selected.model, "gemini-3-pro-preview");
        assert_eq!(selected.command, "gemini");
    }

    #[test]
    fn test_explicit_model_hint() {
        let mut config = ModcommitConfig::default();
        config.agents.repair.model = Some("haiku".to_string());
        let selector = ModelSelector::new(&config);
        assert_eq!(selector.for_role(AgentRole::Repair).unwrap().model, "haiku");

        config.agents.repair.model = Some("gpt-9".to_string());
        let selector = ModelSelector::new(&config);
        assert!(selector.for_role(AgentRole::Repair).is_err());
    }

    #[test]
    fn test_codex_cli_args_carry_reasoning() {
        let config = ModcommitConfig::default();
        let selector = ModelSelector::new(&config);
        let codex = selector.resolve(&declared(LlmProvider::Codex, Some(ModelTier::Standard))).unwrap();
        let args = codex.cli_args();
        assert_eq!(args[0], "exec");
        assert!(args.contains(&"reasoning=medium".to_string()));
    }
}
