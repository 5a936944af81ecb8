use clap::Args;
use std::io;
use std::time::Duration;

use recette::credentials::{ConsolePrompt, CredentialProvider, KeychainCredentials};
use recette::paths;
use recette::pg::PgConnector;
use recette::runner::{self, RecipeRunner, TargetFilter};
use recette::RunReport;

use super::{CmdResult, ConfigArg};

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Only run against targets with this version tag (repeatable)
    #[arg(short = 't', long = "target", value_name = "VERSION")]
    pub targets: Vec<String>,

    /// Install this extension version instead of the control file default
    #[arg(long, value_name = "VERSION")]
    pub extension_version: Option<String>,

    /// Do not copy extension files into the servers' extension directories
    #[arg(long)]
    pub skip_deploy: bool,

    /// Distribution root holding the .sql and .control files (default: current directory)
    #[arg(long, value_name = "DIR")]
    pub dist: Option<String>,

    /// Harness definitions (default: <dist>/recette/asgard_recette.sql)
    #[arg(long, value_name = "FILE")]
    pub harness: Option<String>,

    #[command(flatten)]
    pub config: ConfigArg,

    /// Look up passwords in the system keychain before prompting
    #[arg(long)]
    pub keychain: bool,

    /// Give up connecting to a server after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub connect_timeout: Option<u64>,

    /// Print the run report as JSON on stdout (the text report goes to stderr)
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: RunArgs) -> CmdResult<RunReport> {
    let (config, _source) = args.config.load()?;

    let dist_root = match args.dist.as_deref() {
        Some(dir) => paths::expand(dir)?,
        None => runner::default_dist_root()?,
    };
    runner::validate_dist_root(&dist_root)?;

    let mut connector = PgConnector::new();
    if let Some(seconds) = args.connect_timeout {
        connector = connector.with_connect_timeout(Duration::from_secs(seconds));
    }

    let credentials: Box<dyn CredentialProvider> = if args.keychain || config.use_keychain {
        Box::new(KeychainCredentials::new(ConsolePrompt))
    } else {
        Box::new(ConsolePrompt)
    };

    let mut recipe = RecipeRunner::from_config(&config, connector, credentials, dist_root);
    if let Some(harness) = args.harness.as_deref() {
        recipe = recipe.with_harness_path(paths::expand(harness)?);
    }

    let filter = TargetFilter::versions(args.targets);
    let version = args.extension_version.as_deref();

    let report = if args.json {
        recipe.run(&filter, version, args.skip_deploy, &mut io::stderr())?
    } else {
        recipe.run(&filter, version, args.skip_deploy, &mut io::stdout().lock())?
    };

    let exit_code = report.exit_code();
    Ok((report, exit_code))
}
