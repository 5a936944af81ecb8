//! Per-target and per-run results.

use serde::Serialize;
use serde_json::Value;

use crate::deploy::DeployResult;
use crate::error::Error;

/// One harness function that did not pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestFailure {
    pub function: String,
    pub message: String,
}

impl From<(String, String)> for TestFailure {
    fn from((function, message): (String, String)) -> Self {
        Self { function, message }
    }
}

/// What the harness reported for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestOutcome {
    pub total: i64,
    pub failures: Vec<TestFailure>,
}

impl TestOutcome {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn summary_line(&self) -> String {
        match self.failures.len() {
            0 => format!("... {} tests, aucune erreur", self.total),
            1 => format!("... {} tests, 1 error", self.total),
            n => format!("... {} tests, {} errors", self.total, n),
        }
    }
}

/// Infrastructure failure that stopped a target before it produced results.
#[derive(Debug, Clone, Serialize)]
pub struct InfraError {
    pub code: String,
    pub message: String,
    pub details: Value,
}

impl InfraError {
    pub fn line(&self) -> String {
        match self
            .details
            .get("error")
            .and_then(Value::as_str)
            .filter(|cause| !self.message.contains(cause))
        {
            Some(cause) => format!("!!! {}: {} ({})", self.code, self.message, cause),
            None => format!("!!! {}: {}", self.code, self.message),
        }
    }
}

impl From<&Error> for InfraError {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code.as_str().to_string(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    Completed { outcome: TestOutcome },
    Failed { error: InfraError },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetReport {
    pub version: String,
    pub identity: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed: Option<DeployResult>,
    #[serde(flatten)]
    pub status: TargetStatus,
}

impl TargetReport {
    pub fn outcome(&self) -> Option<&TestOutcome> {
        match &self.status {
            TargetStatus::Completed { outcome } => Some(outcome),
            TargetStatus::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&InfraError> {
        match &self.status {
            TargetStatus::Completed { .. } => None,
            TargetStatus::Failed { error } => Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub started_at: String,
    pub finished_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extension_version: Option<String>,
    pub targets: Vec<TargetReport>,
}

impl RunReport {
    pub fn infra_failures(&self) -> usize {
        self.targets.iter().filter(|t| t.error().is_some()).count()
    }

    pub fn failed_tests(&self) -> usize {
        self.targets
            .iter()
            .filter_map(TargetReport::outcome)
            .map(|o| o.failures.len())
            .sum()
    }

    pub fn all_passed(&self) -> bool {
        self.infra_failures() == 0 && self.failed_tests() == 0
    }

    /// 0 when everything passed, 1 for test failures only, 20 when a target could not run.
    pub fn exit_code(&self) -> i32 {
        if self.infra_failures() > 0 {
            20
        } else if self.failed_tests() > 0 {
            1
        } else {
            0
        }
    }
}
