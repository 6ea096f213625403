//! `modcommit contract`

use super::{load_contract, project_root};
use crate::models::ModcommitConfig;
use crate::validator::IMPLEMENTED_RULES;
use crate::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ContractArgs {
    /// Project root (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,
}

/// Print the resolved contract and check its rules are implemented
pub fn run(args: ContractArgs) -> Result<i32> {
    let root = project_root(args.project_root)?;
    let config = ModcommitConfig::load(&root)?;
    let path = config.contract_path(&root);
    let contract = load_contract(&root, &config)?;

    let source = if path.exists() {
        path.display().to_string()
    } else {
        "bundled".to_string()
    };
    eprintln!(
        "{}",
        format!("Contract {} ({})", contract.version, source).cyan().bold()
    );
    print!("{}", serde_yaml::to_string(&contract)?);

    contract.check_rules(IMPLEMENTED_RULES)?;
    eprintln!(
        "{}",
        format!("✅ All {} rules are implemented", contract.rules.len()).green()
    );
    Ok(crate::exit_codes::OK)
}
