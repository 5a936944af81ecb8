//! Recipe orchestration across targets.
//!
//! Targets are processed one after another. A target that cannot be deployed to,
//! connected to or prepared is reported and skipped; the run goes on.

use std::io::Write;
use std::path::{Path, PathBuf};

use crate::credentials::CredentialProvider;
use crate::defaults::{ExtensionConfig, RecetteConfig};
use crate::deploy::{self, DeployResult};
use crate::error::{Error, Result};
use crate::harness;
use crate::paths;
use crate::registry::RegistryState;
use crate::report::{InfraError, RunReport, TargetReport, TargetStatus, TestOutcome};
use crate::session::{with_session, Connector, SessionPlan};
use crate::target::TargetDescriptor;

pub const SEPARATOR: &str = "--------------";

/// Which targets a run covers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TargetFilter {
    #[default]
    All,
    Versions(Vec<String>),
}

impl TargetFilter {
    /// An empty list means every target.
    pub fn versions<I, S>(versions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let versions: Vec<String> = versions.into_iter().map(Into::into).collect();
        if versions.is_empty() {
            TargetFilter::All
        } else {
            TargetFilter::Versions(versions)
        }
    }

    pub fn matches(&self, target: &TargetDescriptor) -> bool {
        match self {
            TargetFilter::All => true,
            TargetFilter::Versions(versions) => versions.iter().any(|v| v == target.version()),
        }
    }
}

impl From<&str> for TargetFilter {
    fn from(version: &str) -> Self {
        TargetFilter::Versions(vec![version.to_string()])
    }
}

/// Where the recipe material lives and what the extension needs.
#[derive(Debug, Clone)]
pub struct RecipeOptions {
    /// Directory holding the extension's definition and control files.
    pub dist_root: PathBuf,
    /// Harness file; defaults to `recette/asgard_recette.sql` under the distribution root.
    pub harness_path: Option<PathBuf>,
    pub extension: ExtensionConfig,
}

impl RecipeOptions {
    pub fn new(dist_root: impl Into<PathBuf>) -> Self {
        Self {
            dist_root: dist_root.into(),
            harness_path: None,
            extension: ExtensionConfig::default(),
        }
    }

    pub fn harness_path(&self) -> PathBuf {
        self.harness_path
            .clone()
            .unwrap_or_else(|| paths::default_harness(&self.dist_root))
    }
}

pub struct RecipeRunner<C, P> {
    registry: RegistryState,
    connector: C,
    credentials: P,
    options: RecipeOptions,
}

impl<C: Connector, P: CredentialProvider> RecipeRunner<C, P> {
    pub fn new(registry: RegistryState, connector: C, credentials: P, options: RecipeOptions) -> Self {
        Self {
            registry,
            connector,
            credentials,
            options,
        }
    }

    /// Runner over the configured targets.
    pub fn from_config(
        config: &RecetteConfig,
        connector: C,
        credentials: P,
        dist_root: impl Into<PathBuf>,
    ) -> Self {
        let options = RecipeOptions {
            extension: config.extension.clone(),
            ..RecipeOptions::new(dist_root)
        };
        Self::new(RegistryState::from_config(config), connector, credentials, options)
    }

    pub fn with_harness_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.options.harness_path = Some(path.into());
        self
    }

    /// Run the recipe on every target matching `filter` and print results to `out`.
    ///
    /// Only a missing harness or an unresolvable registry fails the whole run.
    /// Per-target problems end up in the report.
    pub fn run(
        &mut self,
        filter: &TargetFilter,
        extension_version: Option<&str>,
        skip_deploy: bool,
        out: &mut dyn Write,
    ) -> Result<RunReport> {
        let started_at = chrono::Utc::now().to_rfc3339();
        let harness_source = harness::load_harness(&self.options.harness_path())?;

        let plan = SessionPlan {
            extension: self.options.extension.name.clone(),
            version: extension_version.map(str::to_string),
            extension_requirements: self.options.extension.requirements.clone(),
            test_requirements: self.options.extension.test_requirements.clone(),
            recipe_schema: self.options.extension.recipe_schema.clone(),
            harness_source,
        };

        let targets: Vec<TargetDescriptor> = self
            .registry
            .targets(&mut self.credentials)?
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();

        let mut reports = Vec::with_capacity(targets.len());
        for target in &targets {
            write_line(out, "")?;
            write_line(out, SEPARATOR)?;
            write_line(out, &target.identity())?;

            let report = self.run_target(target, &plan, skip_deploy);
            print_target_report(out, &report)?;
            reports.push(report);
        }

        Ok(RunReport {
            started_at,
            finished_at: chrono::Utc::now().to_rfc3339(),
            extension_version: extension_version.map(str::to_string),
            targets: reports,
        })
    }

    fn run_target(
        &self,
        target: &TargetDescriptor,
        plan: &SessionPlan,
        skip_deploy: bool,
    ) -> TargetReport {
        let mut deployed = None;
        let result = self
            .deploy_to(target, skip_deploy)
            .and_then(|result| {
                deployed = result;
                with_session(&self.connector, target, plan, |conn| {
                    harness::run_recipe(conn, &plan.recipe_schema)
                })
            });

        let status = match result {
            Ok(outcome) => TargetStatus::Completed { outcome },
            Err(err) => {
                crate::log_status!("recette", "{} failed: {}", target.address(), err.message);
                TargetStatus::Failed {
                    error: InfraError::from(&err),
                }
            }
        };

        TargetReport {
            version: target.version().to_string(),
            identity: target.identity(),
            deployed,
            status,
        }
    }

    fn deploy_to(&self, target: &TargetDescriptor, skip_deploy: bool) -> Result<Option<DeployResult>> {
        if skip_deploy || target.skip_deploy() {
            return Ok(None);
        }
        let Some(dir) = target.extension_dir() else {
            return Ok(None);
        };
        deploy::deploy_artifacts(
            &self.options.dist_root,
            &self.options.extension.artifact_patterns,
            dir,
        )
        .map(Some)
    }
}

fn write_line(out: &mut dyn Write, line: &str) -> Result<()> {
    writeln!(out, "{}", line)
        .map_err(|e| Error::internal_io(e.to_string(), Some("write report".to_string())))
}

fn print_outcome(out: &mut dyn Write, outcome: &TestOutcome) -> Result<()> {
    write_line(out, &outcome.summary_line())?;
    for failure in &outcome.failures {
        write_line(out, &format!("{}: {}", failure.function, failure.message))?;
    }
    Ok(())
}

fn print_target_report(out: &mut dyn Write, report: &TargetReport) -> Result<()> {
    match &report.status {
        TargetStatus::Completed { outcome } => print_outcome(out, outcome),
        TargetStatus::Failed { error } => write_line(out, &error.line()),
    }
}

/// Distribution root used when none is given: the current directory.
pub fn default_dist_root() -> Result<PathBuf> {
    std::env::current_dir()
        .map_err(|e| Error::internal_io(e.to_string(), Some("current directory".to_string())))
}

/// Check that `dist_root` is a directory before a run that deploys from it.
pub fn validate_dist_root(dist_root: &Path) -> Result<()> {
    deploy::require_dir(dist_root)
}
