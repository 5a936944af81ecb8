use clap::Args;
use serde::Serialize;

use recette::defaults::{self, RecetteConfig};

use super::{describe_source, CmdResult, ConfigArg};

#[derive(Args, Debug, Default)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub config: ConfigArg,

    /// Show built-in defaults, ignoring any configuration file
    #[arg(long)]
    pub builtin: bool,
}

#[derive(Debug, Serialize)]
pub struct ConfigOutput {
    pub source: String,
    pub config: RecetteConfig,
}

/// Print the effective configuration. Passwords are never serialized.
pub fn run(args: ConfigArgs) -> CmdResult<ConfigOutput> {
    if args.builtin {
        return Ok((
            ConfigOutput {
                source: "built-in".to_string(),
                config: defaults::builtin_config(),
            },
            0,
        ));
    }

    let (config, source) = args.config.load()?;
    Ok((
        ConfigOutput {
            source: describe_source(&source),
            config,
        },
        0,
    ))
}
