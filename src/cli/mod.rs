pub mod contract;
pub mod generate;
pub mod normalize;
pub mod validate;

use crate::models::{Contract, ModcommitConfig, ModuleMap, ValidationResult};
use crate::Result;
use anyhow::Context;
use std::io::Read;
use std::path::{Path, PathBuf};

/// First line of the block a host extracts the message from
pub const OUTPUT_START: &str = ">>>>>>OUTPUT START<<<<<<";
/// Line closing the message block
pub const OUTPUT_END: &str = "---";

/// Module map looked up when `--modules` is not given
pub const DEFAULT_MODULE_MAP: &str = ".modcommit/modules.yml";

/// Stdout text: marker block around the message, then diagnostics
pub fn render_output(message: &str, result: &ValidationResult) -> String {
    let mut out = String::new();
    out.push_str(OUTPUT_START);
    out.push('\n');
    out.push_str(message);
    if !message.is_empty() && !message.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(OUTPUT_END);
    out.push('\n');

    let diagnostics = result.format_errors();
    if !diagnostics.is_empty() {
        out.push_str(&diagnostics);
        if !diagnostics.ends_with('\n') {
            out.push('\n');
        }
    }
    out
}

/// Read a file, or stdin when `path` is `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn project_root(explicit: Option<PathBuf>) -> Result<PathBuf> {
    match explicit {
        Some(root) => Ok(root),
        None => Ok(std::env::current_dir()?),
    }
}

/// Contract for the configured version, bundled when the project has none
pub fn load_contract(project_root: &Path, config: &ModcommitConfig) -> Result<Contract> {
    let path = config.contract_path(project_root);
    let contract = Contract::resolve(&path, &config.workflow.contract_version)?;
    Ok(contract)
}

/// Explicit module map, else the project default, else an empty map
pub fn load_module_map(project_root: &Path, explicit: Option<&Path>) -> Result<ModuleMap> {
    if let Some(path) = explicit {
        return ModuleMap::load(path);
    }
    let default = project_root.join(DEFAULT_MODULE_MAP);
    if default.exists() {
        return ModuleMap::load(&default);
    }
    tracing::debug!(path = %default.display(), "no module map");
    Ok(ModuleMap::new())
}
