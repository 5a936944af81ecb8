use clap::Args;

use recette::defaults::{self, ConfigSource, RecetteConfig};
use recette::paths;

pub type CmdResult<T> = recette::Result<(T, i32)>;

/// Shared `--config` flag.
#[derive(Args, Default, Debug, Clone)]
pub struct ConfigArg {
    /// Configuration file (default: ~/.config/recette/recette.json, then built-in targets)
    #[arg(long, value_name = "FILE")]
    pub config: Option<String>,
}

impl ConfigArg {
    pub fn load(&self) -> recette::Result<(RecetteConfig, ConfigSource)> {
        let explicit = self.config.as_deref().map(paths::expand).transpose()?;
        defaults::load_config(explicit.as_deref())
    }
}

pub fn describe_source(source: &ConfigSource) -> String {
    match source {
        ConfigSource::File(path) => path.display().to_string(),
        ConfigSource::Builtin => "built-in".to_string(),
    }
}

pub mod config;
pub mod keychain;
pub mod run;
pub mod targets;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args))
    };
}

pub(crate) fn run_json(command: crate::Commands) -> (recette::Result<serde_json::Value>, i32) {
    match command {
        crate::Commands::Run(args) => dispatch!(args, run),
        crate::Commands::Targets(args) => dispatch!(args, targets),
        crate::Commands::Config(args) => dispatch!(args, config),
        crate::Commands::Keychain(args) => dispatch!(args, keychain),
    }
}
