use crate::models::AgentRole;
use crate::orchestrator::cli_mapper::LlmProvider;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Relative location of the config file under the project root
pub const CONFIG_PATH: &str = ".modcommit/config.toml";

// =============================================================================
// Model Tiers
// =============================================================================

/// How much reasoning a role needs, used for model selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    /// Short, formulaic output (module sections)
    Light,
    /// Summaries across the whole change set
    Standard,
    /// Corrections under a strict contract
    Strong,
}

// =============================================================================
// Provider Configuration
// =============================================================================

/// One model offered by a provider CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderModelConfig {
    /// Model identifier (e.g., "fast", "balanced", "deep")
    pub id: String,
    /// Model name passed to the CLI (e.g., "haiku", "gpt-5.2-codex")
    pub model: String,
    /// Reasoning level, only used by Codex
    #[serde(default)]
    pub reasoning: Option<String>,
    /// Highest tier this model handles
    pub tier: ModelTier,
}

/// Command and model list for one provider CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub command: String,
    pub models: Vec<ProviderModelConfig>,
    /// Model ID used by agents declared without a tier
    pub default: String,
}

fn model(id: &str, name: &str, reasoning: Option<&str>, tier: ModelTier) -> ProviderModelConfig {
    ProviderModelConfig {
        id: id.to_string(),
        model: name.to_string(),
        reasoning: reasoning.map(str::to_string),
        tier,
    }
}

fn default_claude() -> ProviderConfig {
    ProviderConfig {
        command: "claude".to_string(),
        models: vec![
            model("fast", "haiku", None, ModelTier::Light),
            model("balanced", "sonnet", None, ModelTier::Standard),
            model("deep", "opus", None, ModelTier::Strong),
        ],
        default: "balanced".to_string(),
    }
}

fn default_codex() -> ProviderConfig {
    ProviderConfig {
        command: "codex".to_string(),
        models: vec![
            model("fast", "gpt-5.2-codex", Some("low"), ModelTier::Light),
            model("balanced", "gpt-5.2-codex", Some("medium"), ModelTier::Standard),
            model("deep", "gpt-5.2-codex", Some("high"), ModelTier::Strong),
        ],
        default: "balanced".to_string(),
    }
}

fn default_gemini() -> ProviderConfig {
    ProviderConfig {
        command: "gemini".to_string(),
        models: vec![
            model("flash", "gemini-3-flash-preview", None, ModelTier::Standard),
            model("pro", "gemini-3-pro-preview", None, ModelTier::Strong),
        ],
        default: "flash".to_string(),
    }
}

impl ProviderConfig {
    /// Cheapest model that can handle `tier`, else the strongest available
    pub fn select_model(&self, tier: ModelTier) -> Option<&ProviderModelConfig> {
        self.models
            .iter()
            .filter(|m| m.tier >= tier)
            .min_by_key(|m| m.tier)
            .or_else(|| self.models.iter().max_by_key(|m| m.tier))
    }

    /// The `default` model, else the first one listed
    pub fn default_model(&self) -> Option<&ProviderModelConfig> {
        self.models
            .iter()
            .find(|m| m.id == self.default)
            .or_else(|| self.models.first())
    }

    /// Look a model up by ID or by CLI name
    pub fn find_model(&self, hint: &str) -> Option<&ProviderModelConfig> {
        self.models.iter().find(|m| m.id == hint || m.model == hint)
    }
}

// =============================================================================
// Agent Declarations
// =============================================================================

/// Which provider and tier serves a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDeclaration {
    pub provider: LlmProvider,
    /// Unset means the provider's default model
    #[serde(default)]
    pub tier: Option<ModelTier>,
    /// Explicit model ID or name, bypassing tier selection
    #[serde(default)]
    pub model: Option<String>,
}

impl AgentDeclaration {
    fn claude(tier: ModelTier) -> Self {
        Self {
            provider: LlmProvider::Claude,
            tier: Some(tier),
            model: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDeclarations {
    #[serde(default = "default_top_level_agent")]
    pub top_level: AgentDeclaration,
    #[serde(default = "default_module_agent")]
    pub module: AgentDeclaration,
    #[serde(default = "default_repair_agent")]
    pub repair: AgentDeclaration,
}

fn default_top_level_agent() -> AgentDeclaration {
    AgentDeclaration::claude(ModelTier::Standard)
}

fn default_module_agent() -> AgentDeclaration {
    AgentDeclaration::claude(ModelTier::Light)
}

fn default_repair_agent() -> AgentDeclaration {
    AgentDeclaration::claude(ModelTier::Strong)
}

impl Default for AgentDeclarations {
    fn default() -> Self {
        Self {
            top_level: default_top_level_agent(),
            module: default_module_agent(),
            repair: default_repair_agent(),
        }
    }
}

impl AgentDeclarations {
    pub fn for_role(&self, role: AgentRole) -> &AgentDeclaration {
        match role {
            AgentRole::TopLevel => &self.top_level,
            AgentRole::Module => &self.module,
            AgentRole::Repair => &self.repair,
        }
    }
}

// =============================================================================
// Workflow / Debug
// =============================================================================

/// Pipeline limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Repair attempts after the first validation
    #[serde(default = "default_repair_iterations")]
    pub repair_iterations: u32,
    /// Upper bound for a single agent invocation
    #[serde(default = "default_agent_timeout_secs")]
    pub agent_timeout_secs: u64,
    /// Agent invocations in flight at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Diff characters embedded in one prompt
    #[serde(default = "default_max_diff_chars")]
    pub max_diff_chars: usize,
    #[serde(default = "default_contract_version")]
    pub contract_version: String,
    /// Directory holding `<version>/structure.yml`, relative to the project root
    #[serde(default = "default_contract_dir")]
    pub contract_dir: PathBuf,
}

fn default_repair_iterations() -> u32 {
    1
}

fn default_agent_timeout_secs() -> u64 {
    180
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_diff_chars() -> usize {
    120_000
}

fn default_contract_version() -> String {
    "1.0.0".to_string()
}

fn default_contract_dir() -> PathBuf {
    PathBuf::from("contracts/commit-message")
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            repair_iterations: default_repair_iterations(),
            agent_timeout_secs: default_agent_timeout_secs(),
            max_concurrency: default_max_concurrency(),
            max_diff_chars: default_max_diff_chars(),
            contract_version: default_contract_version(),
            contract_dir: default_contract_dir(),
        }
    }
}

/// Intermediate artifact dumps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebugConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_debug_dir")]
    pub dir: PathBuf,
}

fn default_debug_dir() -> PathBuf {
    PathBuf::from(".modcommit/debug")
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: default_debug_dir(),
        }
    }
}

// =============================================================================
// Modcommit Configuration
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModcommitConfig {
    #[serde(default = "default_claude")]
    pub claude: ProviderConfig,
    #[serde(default = "default_codex")]
    pub codex: ProviderConfig,
    #[serde(default = "default_gemini")]
    pub gemini: ProviderConfig,
    #[serde(default)]
    pub agents: AgentDeclarations,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

impl Default for ModcommitConfig {
    fn default() -> Self {
        Self {
            claude: default_claude(),
            codex: default_codex(),
            gemini: default_gemini(),
            agents: AgentDeclarations::default(),
            workflow: WorkflowConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl ModcommitConfig {
    /// Load config from `.modcommit/config.toml`, defaults when absent
    pub fn load(project_root: &Path) -> anyhow::Result<Self> {
        let config_path = project_root.join(CONFIG_PATH);
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: ModcommitConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn provider(&self, provider: LlmProvider) -> &ProviderConfig {
        match provider {
            LlmProvider::Claude => &self.claude,
            LlmProvider::Codex => &self.codex,
            LlmProvider::Gemini => &self.gemini,
        }
    }

    /// Absolute path of the contract file for the configured version
    pub fn contract_path(&self, project_root: &Path) -> PathBuf {
        project_root
            .join(&self.workflow.contract_dir)
            .join(&self.workflow.contract_version)
            .join("structure.yml")
    }
}
