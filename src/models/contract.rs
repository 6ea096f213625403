use crate::error::ContractError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Contract shipped with the binary, used when the project has none
pub const BUNDLED_CONTRACT: &str = include_str!("../../contracts/commit-message/1.0.0/structure.yml");

/// Version of [`BUNDLED_CONTRACT`]
pub const BUNDLED_VERSION: &str = "1.0.0";

/// Declarative structure of a commit message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub version: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub sections: SectionRules,
    #[serde(default)]
    pub title: TitleRules,
    #[serde(default)]
    pub subject: SubjectRules,
    #[serde(default)]
    pub limits: Limits,
    /// Lines that must appear at the end of the message
    #[serde(default)]
    pub trailing_markers: Vec<String>,
    /// Rule ids the validator must enforce
    pub rules: Vec<String>,
}

fn default_name() -> String {
    "commit-message".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRules {
    #[serde(default = "default_kinds")]
    pub kinds: Vec<String>,
    #[serde(default = "default_separator")]
    pub separator: String,
}

fn default_kinds() -> Vec<String> {
    vec!["top_level".to_string(), "module".to_string()]
}

fn default_separator() -> String {
    "---".to_string()
}

impl Default for SectionRules {
    fn default() -> Self {
        Self {
            kinds: default_kinds(),
            separator: default_separator(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleRules {
    /// Scope used in the title when several modules are affected
    #[serde(default = "default_multi_module_scope")]
    pub multi_module_scope: String,
}

fn default_multi_module_scope() -> String {
    "multi-module".to_string()
}

impl Default for TitleRules {
    fn default() -> Self {
        Self {
            multi_module_scope: default_multi_module_scope(),
        }
    }
}

/// `<module>: <type>[!]: <description>` grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectRules {
    #[serde(default = "default_types")]
    pub types: Vec<String>,
    #[serde(default = "default_true")]
    pub allow_breaking: bool,
}

fn default_types() -> Vec<String> {
    crate::parser::classify::DEFAULT_CHANGE_TYPES
        .iter()
        .map(|t| t.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

impl Default for SubjectRules {
    fn default() -> Self {
        Self {
            types: default_types(),
            allow_breaking: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    #[serde(default = "default_limit")]
    pub title_max: usize,
    #[serde(default = "default_limit")]
    pub subject_max: usize,
    #[serde(default = "default_limit")]
    pub body_max: usize,
}

fn default_limit() -> usize {
    72
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            title_max: 72,
            subject_max: 72,
            body_max: 72,
        }
    }
}

impl Default for Contract {
    fn default() -> Self {
        Self::bundled()
    }
}

impl Contract {
    /// Parse contract YAML and check its version string
    pub fn from_yaml(content: &str) -> Result<Self, ContractError> {
        let contract: Contract = serde_yaml::from_str(content)?;
        semver::Version::parse(&contract.version)
            .map_err(|_| ContractError::InvalidVersion(contract.version.clone()))?;
        Ok(contract)
    }

    /// The compiled-in 1.0.0 contract
    pub fn bundled() -> Self {
        // Checked by test_bundled_contract_parses
        Self::from_yaml(BUNDLED_CONTRACT).expect("bundled contract must parse")
    }

    /// Load a contract file that must declare `expected_version`
    pub fn load(path: &Path, expected_version: &str) -> Result<Self, ContractError> {
        let content = std::fs::read_to_string(path).map_err(|source| ContractError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let contract = Self::from_yaml(&content)?;
        contract.check_version(expected_version)?;
        Ok(contract)
    }

    /// Load from the canonical path, falling back to the bundled contract
    /// when the project carries none for the bundled version
    pub fn resolve(path: &Path, version: &str) -> Result<Self, ContractError> {
        if path.exists() {
            return Self::load(path, version);
        }
        let bundled = Self::bundled();
        if bundled.check_version(version).is_ok() {
            tracing::debug!(path = %path.display(), "no project contract, using bundled");
            return Ok(bundled);
        }
        Err(ContractError::NotFound {
            version: version.to_string(),
            path: path.to_path_buf(),
        })
    }

    fn check_version(&self, expected: &str) -> Result<(), ContractError> {
        let found = semver::Version::parse(&self.version)
            .map_err(|_| ContractError::InvalidVersion(self.version.clone()))?;
        let wanted = semver::Version::parse(expected)
            .map_err(|_| ContractError::InvalidVersion(expected.to_string()))?;
        if found != wanted {
            return Err(ContractError::VersionMismatch {
                expected: expected.to_string(),
                found: self.version.clone(),
            });
        }
        Ok(())
    }

    /// Fail when the contract declares a rule missing from `implemented`
    pub fn check_rules(&self, implemented: &[&str]) -> Result<(), ContractError> {
        let missing: Vec<String> = self
            .rules
            .iter()
            .filter(|rule| !implemented.contains(&rule.as_str()))
            .cloned()
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ContractError::UnsupportedRules(missing))
        }
    }

    pub fn has_rule(&self, rule: &str) -> bool {
        self.rules.iter().any(|r| r == rule)
    }

    /// Signature line the normalizer must keep last, if any
    pub fn signature(&self) -> Option<&str> {
        self.trailing_markers.last().map(String::as_str)
    }
}
