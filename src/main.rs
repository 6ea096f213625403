use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use modcommit::cli::contract::ContractArgs;
use modcommit::cli::generate::GenerateArgs;
use modcommit::cli::normalize::NormalizeArgs;
use modcommit::cli::validate::ValidateArgs;
use modcommit::{exit_codes, PipelineError, Result};
use std::io;

#[derive(Parser)]
#[command(name = "modcommit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Multi-module commit message generator", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a commit message for a diff (agents + validation + repair)
    Generate(GenerateArgs),

    /// Normalize a commit message to the contract's layout
    Normalize(NormalizeArgs),

    /// Validate a commit message against the contract
    Validate(ValidateArgs),

    /// Print the resolved contract and check its rules
    Contract(ContractArgs),

    /// Generate shell completions
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();
    modcommit::logging::init();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("{}", format!("Error: failed to create tokio runtime: {}", e).red());
            std::process::exit(exit_codes::FATAL);
        }
    };

    let code = match runtime.block_on(run_async(cli)) {
        Ok(code) => code,
        Err(e) => match e.downcast_ref::<PipelineError>() {
            Some(PipelineError::Cancelled) => {
                eprintln!("{}", "Cancelled".yellow());
                exit_codes::CANCELLED
            }
            _ => {
                eprintln!("{}", format!("Error: {:#}", e).red());
                exit_codes::FATAL
            }
        },
    };
    std::process::exit(code);
}

async fn run_async(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Generate(args) => modcommit::cli::generate::run(args).await,
        Commands::Normalize(args) => modcommit::cli::normalize::run(args),
        Commands::Validate(args) => modcommit::cli::validate::run(args),
        Commands::Contract(args) => modcommit::cli::contract::run(args),
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "modcommit", &mut io::stdout());
            Ok(exit_codes::OK)
        }
    }
}
