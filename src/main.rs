use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{config, keychain, run, targets};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "recette")]
#[command(version = VERSION)]
#[command(about = "Run the asgard acceptance recipe against a set of PostgreSQL servers")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the extension and run the recipe on every target (default)
    Run(run::RunArgs),
    /// List configured targets
    Targets(targets::TargetsArgs),
    /// Show the effective configuration
    Config(config::ConfigArgs),
    /// Manage passwords stored in the system keychain
    Keychain(keychain::KeychainArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Run(run::RunArgs::default()));

    // The recipe report is meant for people unless --json asks otherwise.
    if let Commands::Run(args) = command {
        if !args.json {
            let exit_code = match run::run(args) {
                Ok((_, exit_code)) => exit_code,
                Err(err) => {
                    output::print_human_error(&err);
                    output::exit_code_for_error(err.code)
                }
            };
            return std::process::ExitCode::from(exit_code_to_u8(exit_code));
        }
        return finish_json(commands::run_json(Commands::Run(args)));
    }

    finish_json(commands::run_json(command))
}

fn finish_json((json_result, exit_code): (recette::Result<serde_json::Value>, i32)) -> std::process::ExitCode {
    if let Err(err) = output::print_json_result(json_result) {
        output::print_human_error(&err);
        return std::process::ExitCode::from(exit_code_to_u8(1));
    }
    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
