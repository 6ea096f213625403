use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// A staged file and the modules that own it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedFile {
    pub path: String,
    #[serde(default)]
    pub modules: Vec<String>,
}

impl StagedFile {
    pub fn new(path: impl Into<String>, modules: &[&str]) -> Self {
        Self {
            path: path.into(),
            modules: modules.iter().map(|m| m.to_string()).collect(),
        }
    }

    pub fn is_owned_by(&self, module: &str) -> bool {
        self.modules.iter().any(|m| m == module)
    }
}

/// Pre-computed mapping from file path to owning modules
///
/// Supplied by whatever classifies files into modules; stored as YAML
/// (or JSON) of the form `path: [module, ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleMap {
    entries: BTreeMap<String, Vec<String>>,
}

impl ModuleMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, modules: Vec<String>) {
        self.entries.insert(path.into(), modules);
    }

    /// Modules owning `path`, empty when unmapped
    pub fn modules_for(&self, path: &str) -> Vec<String> {
        self.entries.get(path).cloned().unwrap_or_default()
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).context("Failed to parse module map")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read module map {}", path.display()))?;
        Self::from_yaml(&content)
    }
}

/// Everything known about the staged change set, built once per run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffContext {
    /// Sorted, de-duplicated union of all staged-file modules
    pub affected_modules: Vec<String>,
    pub staged_files: Vec<StagedFile>,
    pub unified_diff: String,
}

impl DiffContext {
    pub fn new(staged_files: Vec<StagedFile>, unified_diff: impl Into<String>) -> Self {
        let affected: BTreeSet<&str> = staged_files
            .iter()
            .flat_map(|f| f.modules.iter().map(String::as_str))
            .collect();

        Self {
            affected_modules: affected.into_iter().map(str::to_string).collect(),
            staged_files,
            unified_diff: unified_diff.into(),
        }
    }

    /// Build from a raw diff, taking staged files from its headers
    pub fn from_diff(unified_diff: impl Into<String>, module_map: &ModuleMap) -> Self {
        let unified_diff = unified_diff.into();
        let staged_files = crate::context::split_diff(&unified_diff)
            .into_iter()
            .map(|chunk| StagedFile {
                modules: module_map.modules_for(&chunk.path),
                path: chunk.path,
            })
            .collect();

        Self::new(staged_files, unified_diff)
    }

    pub fn is_multi_module(&self) -> bool {
        self.affected_modules.len() > 1
    }

    /// Paths owned by `module`, in staged order
    pub fn files_for(&self, module: &str) -> Vec<String> {
        self.staged_files
            .iter()
            .filter(|f| f.is_owned_by(module))
            .map(|f| f.path.clone())
            .collect()
    }
}

/// Per-module slice of the change set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleContext {
    pub module_name: String,
    pub files: Vec<String>,
    /// Only chunks whose file path is owned by `module_name`
    pub module_diff: String,
}

/// One file's chunk of a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    pub path: String,
    pub text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_affected_modules_sorted_and_unique() {
        let ctx = DiffContext::new(
            vec![
                StagedFile::new("web/app.ts", &["web"]),
                StagedFile::new("api/lib.rs", &["api"]),
                StagedFile::new("shared/types.rs", &["web", "api"]),
                StagedFile::new("README.md", &[]),
            ],
            "",
        );
        assert_eq!(ctx.affected_modules, vec!["api", "web"]);
        assert!(ctx.is_multi_module());
        assert_eq!(ctx.files_for("api"), vec!["api/lib.rs", "shared/types.rs"]);
    }

    #[test]
    fn test_module_map_yaml() {
        let map = ModuleMap::from_yaml("src/api.rs: [api]\ndocs/a.md:\n  - docs\n  - site\n").unwrap();
        assert_eq!(map.modules_for("src/api.rs"), vec!["api"]);
        assert_eq!(map.modules_for("docs/a.md"), vec!["docs", "site"]);
        assert!(map.modules_for("unknown").is_empty());
    }

    #[test]
    fn test_module_map_accepts_json() {
        let map = ModuleMap::from_yaml(r#"{"a.rs": ["core"]}"#).unwrap();
        assert_eq!(map.modules_for("a.rs"), vec!["core"]);
    }

    #[test]
    fn test_empty_module_map() {
        assert_eq!(ModuleMap::from_yaml("  \n").unwrap(), ModuleMap::new());
    }
}
