//! `modcommit normalize`

use super::{load_contract, project_root, read_input};
use crate::formatter::{NormalizeOptions, Normalizer};
use crate::models::ModcommitConfig;
use crate::Result;
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Message to normalize (`-` for stdin)
    #[arg(default_value = "-")]
    pub file: PathBuf,

    /// Project root (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub project_root: Option<PathBuf>,
}

/// Print the normalized message to stdout
pub fn run(args: NormalizeArgs) -> Result<i32> {
    let root = project_root(args.project_root)?;
    let config = ModcommitConfig::load(&root)?;
    let contract = load_contract(&root, &config)?;

    let text = read_input(&args.file)?;
    let normalizer = Normalizer::new(NormalizeOptions::from_contract(&contract));
    print!("{}", normalizer.normalize(&text));
    Ok(crate::exit_codes::OK)
}
