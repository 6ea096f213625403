pub mod config;
pub mod contract;
pub mod diff;
pub mod draft;
pub mod validation;

pub use config::{AgentDeclaration, ModcommitConfig, ModelTier, ProviderConfig, WorkflowConfig};
pub use contract::Contract;
pub use diff::{DiffContext, FileDiff, ModuleContext, ModuleMap, StagedFile};
pub use draft::{AgentResponse, AgentRole, CommitMessageDraft, Section, SectionKind};
pub use validation::{Severity, ValidationError, ValidationResult};
