use clap::Args;
use serde::Serialize;

use super::{describe_source, CmdResult, ConfigArg};

#[derive(Args, Debug, Default)]
pub struct TargetsArgs {
    #[command(flatten)]
    pub config: ConfigArg,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetEntry {
    pub version: String,
    pub identity: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_dir: Option<String>,
    pub deploy: bool,
    /// Whether a password is written in the configuration.
    pub password_configured: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetsOutput {
    pub source: String,
    pub targets: Vec<TargetEntry>,
}

/// List configured targets without resolving any password.
pub fn run(args: TargetsArgs) -> CmdResult<TargetsOutput> {
    let (config, source) = args.config.load()?;
    let template = config.extension.extension_dir_template.as_deref();

    let targets = config
        .targets
        .iter()
        .map(|target| {
            let extension_dir = target.resolve_extension_dir(template)?;
            Ok(TargetEntry {
                version: target.version.clone(),
                identity: target.identity(),
                user: target.user.clone(),
                deploy: extension_dir.is_some(),
                extension_dir: extension_dir.map(|d| d.display().to_string()),
                password_configured: target.password.as_deref().is_some_and(|p| !p.is_empty()),
            })
        })
        .collect::<recette::Result<Vec<_>>>()?;

    Ok((
        TargetsOutput {
            source: describe_source(&source),
            targets,
        },
        0,
    ))
}
