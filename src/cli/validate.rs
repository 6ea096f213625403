//! `modcommit validate`

use super::{load_contract, load_module_map, project_root, read_input, render_output};
use crate::exit_codes;
use crate::models::{DiffContext, ModcommitConfig, ModuleMap};
use crate::validator::ContractValidator;
use crate::Result;
use clap::Args;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Message to validate (`-` for stdin)
    pub file: PathBuf,

    /// Module map; affected modules come from the files of `--diff`
    #[arg(long, value_name = "FILE", requires = "diff")]
    pub modules: Option<PathBuf>,

    /// Diff the message describes, used with `--modules`
    #[arg(long, value_name = "FILE")]
    pub diff: Option<PathBuf>,

    /// Affected module (repeatable); overrides `--modules`
    #[arg(long = "module", value_name = "NAME")]
    pub module_names: Vec<String>,

    /// Print violations as JSON instead of the output block
    #[arg(long)]
    pub json: bool,

    /// Project root (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,
}

/// Validate as-is (no normalization) and print the output contract
pub fn run(args: ValidateArgs) -> Result<i32> {
    let root = project_root(args.project_root.clone())?;
    let config = ModcommitConfig::load(&root)?;
    let contract = load_contract(&root, &config)?;
    let validator = ContractValidator::new(&contract)?;

    let text = read_input(&args.file)?;
    let affected = affected_modules(&args, &load_module_map(&root, args.modules.as_deref())?)?;
    tracing::debug!(modules = ?affected, "validating message");

    let result = validator.validate(&text, &affected);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print!("{}", render_output(&text, &result));
    }

    Ok(if result.is_valid() {
        exit_codes::OK
    } else {
        exit_codes::UNRESOLVED_ERRORS
    })
}

fn affected_modules(args: &ValidateArgs, module_map: &ModuleMap) -> Result<Vec<String>> {
    if !args.module_names.is_empty() {
        let names: BTreeSet<String> = args.module_names.iter().cloned().collect();
        return Ok(names.into_iter().collect());
    }
    match &args.diff {
        Some(path) => {
            let diff = read_input(path)?;
            Ok(DiffContext::from_diff(diff, module_map).affected_modules)
        }
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ValidationError, ValidationResult};

    fn args(module_names: &[&str]) -> ValidateArgs {
        ValidateArgs {
            file: PathBuf::from("-"),
            modules: None,
            diff: None,
            module_names: module_names.iter().map(|m| m.to_string()).collect(),
            json: false,
            project_root: None,
        }
    }

    #[test]
    fn test_module_flags_sorted_and_deduplicated() {
        let affected = affected_modules(&args(&["docs", "api", "docs"]), &ModuleMap::new()).unwrap();
        assert_eq!(affected, vec!["api".to_string(), "docs".to_string()]);
    }

    #[test]
    fn test_affected_modules_from_diff() {
        let dir = tempfile::TempDir::new().unwrap();
        let diff_path = dir.path().join("change.diff");
        std::fs::write(
            &diff_path,
            "diff --git a/src/api.rs b/src/api.rs\n--- a/src/api.rs\n+++ b/src/api.rs\n@@ -1 +1 @@\n-a\n+b\n",
        )
        .unwrap();
        let mut map = ModuleMap::new();
        map.insert("src/api.rs", vec!["api".to_string()]);

        let mut validate = args(&[]);
        validate.diff = Some(diff_path);
        assert_eq!(affected_modules(&validate, &map).unwrap(), vec!["api".to_string()]);
    }

    #[test]
    fn test_json_report_shape() {
        let result = ValidationResult::new(vec![ValidationError::error(
            "unbalanced-fence",
            "Code fence is opened but never closed",
            Some(4),
        )]);
        let json: serde_json::Value = serde_json::to_value(&result).unwrap();
        assert_eq!(json["errors"][0]["code"], "unbalanced-fence");
        assert_eq!(json["errors"][0]["severity"], "error");
        assert_eq!(json["errors"][0]["line"], 4);
    }
}
