#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use recette::credentials::{CredentialProvider, PasswordContext};
use recette::session::{Connection, Connector, SessionPlan};
use recette::{Error, Result, TargetConfig, TargetDescriptor};

pub const HARNESS: &str = "CREATE FUNCTION z_asgard_recette.t001() RETURNS boolean AS $$ SELECT true $$ LANGUAGE sql ;";

/// Answers prompts from a fixed list, then fails. Records every context it was asked for.
#[derive(Debug, Default)]
pub struct ScriptedCredentials {
    answers: VecDeque<String>,
    pub asked: Vec<PasswordContext>,
}

impl ScriptedCredentials {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            asked: Vec::new(),
        }
    }
}

impl CredentialProvider for ScriptedCredentials {
    fn read_password(&mut self, context: &PasswordContext) -> Result<String> {
        self.asked.push(context.clone());
        self.answers.pop_front().ok_or_else(|| {
            Error::internal_unexpected(format!("No scripted answer for: {}", context.prompt()))
        })
    }
}

/// What the fake servers saw, shared between the connector and its connections.
#[derive(Debug, Default)]
pub struct FakeState {
    pub connects: Vec<u16>,
    pub closes: Vec<u16>,
    pub statements: Vec<(u16, String)>,
    pub refuse_ports: Vec<u16>,
    pub fail_on: Vec<String>,
    pub version_available: bool,
    pub totals: HashMap<u16, i64>,
    pub failures: HashMap<u16, Vec<(String, String)>>,
}

impl FakeState {
    pub fn statements_for(&self, port: u16) -> Vec<String> {
        self.statements
            .iter()
            .filter(|(p, _)| *p == port)
            .map(|(_, sql)| sql.clone())
            .collect()
    }

    pub fn closes_for(&self, port: u16) -> usize {
        self.closes.iter().filter(|p| **p == port).count()
    }
}

#[derive(Clone, Default)]
pub struct FakeConnector {
    pub state: Rc<RefCell<FakeState>>,
}

impl FakeConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(self, port: u16) -> Self {
        self.state.borrow_mut().refuse_ports.push(port);
        self
    }

    /// Fail every statement containing `fragment`.
    pub fn fail_on(self, fragment: &str) -> Self {
        self.state.borrow_mut().fail_on.push(fragment.to_string());
        self
    }

    pub fn with_version_available(self) -> Self {
        self.state.borrow_mut().version_available = true;
        self
    }

    pub fn with_results(self, port: u16, total: i64, failures: &[(&str, &str)]) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.totals.insert(port, total);
            state.failures.insert(
                port,
                failures
                    .iter()
                    .map(|(f, m)| (f.to_string(), m.to_string()))
                    .collect(),
            );
        }
        self
    }
}

impl Connector for FakeConnector {
    fn connect(&self, target: &TargetDescriptor) -> Result<Box<dyn Connection>> {
        let mut state = self.state.borrow_mut();
        if state.refuse_ports.contains(&target.port()) {
            return Err(Error::db_connect_failed(
                target.address(),
                "connection refused",
            ));
        }
        state.connects.push(target.port());
        Ok(Box::new(FakeConnection {
            port: target.port(),
            state: Rc::clone(&self.state),
        }))
    }
}

pub struct FakeConnection {
    port: u16,
    state: Rc<RefCell<FakeState>>,
}

impl FakeConnection {
    fn record(&self, sql: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.statements.push((self.port, sql.to_string()));
        if state.fail_on.iter().any(|fragment| sql.contains(fragment.as_str())) {
            return Err(Error::db_statement_failed(
                "simulated failure",
                Some("XX000".to_string()),
                Some(sql.to_string()),
            ));
        }
        Ok(())
    }
}

impl Connection for FakeConnection {
    fn batch_execute(&mut self, sql: &str) -> Result<()> {
        self.record(sql)
    }

    fn query_i64(&mut self, sql: &str) -> Result<i64> {
        self.record(sql)?;
        let state = self.state.borrow();
        if sql.contains("pg_available_extension_versions") {
            return Ok(if state.version_available { 1 } else { 0 });
        }
        Ok(state.totals.get(&self.port).copied().unwrap_or(0))
    }

    fn query_pairs(&mut self, sql: &str) -> Result<Vec<(String, String)>> {
        self.record(sql)?;
        Ok(self
            .state
            .borrow()
            .failures
            .get(&self.port)
            .cloned()
            .unwrap_or_default())
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.state.borrow_mut().closes.push(self.port);
        Ok(())
    }
}

pub fn plan(version: Option<&str>) -> SessionPlan {
    SessionPlan {
        extension: "asgard".to_string(),
        version: version.map(str::to_string),
        extension_requirements: Vec::new(),
        test_requirements: vec!["postgres_fdw".to_string()],
        recipe_schema: "z_asgard_recette".to_string(),
        harness_source: HARNESS.to_string(),
    }
}

pub fn target_config(version: &str, port: u16) -> TargetConfig {
    TargetConfig {
        port,
        password: Some("secret".to_string()),
        ..TargetConfig::new(version)
    }
}

pub fn descriptor(version: &str, port: u16) -> TargetDescriptor {
    TargetDescriptor::new(&target_config(version, port), "secret", None)
}

/// A distribution root with extension files and the harness.
pub fn write_dist(root: &Path) {
    fs::write(root.join("asgard--1.4.0.sql"), "-- asgard 1.4.0").unwrap();
    fs::write(root.join("asgard.control"), "default_version = '1.4.0'").unwrap();
    fs::write(root.join("README.md"), "not deployed").unwrap();
    fs::create_dir_all(root.join("recette")).unwrap();
    fs::write(root.join("recette").join("asgard_recette.sql"), HARNESS).unwrap();
}
