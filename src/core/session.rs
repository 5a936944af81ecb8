//! Per-target extension lifecycle.
//!
//! A session connects to one target, installs the prerequisites, resets the
//! extension under test, loads the harness functions and then lends the live
//! connection to the caller. The connection is closed exactly once, whatever
//! step fails.

use std::fmt;

use crate::error::{Error, Result};
use crate::target::TargetDescriptor;
use crate::utils::sql::{quote_ident, quote_literal};

/// Database operations the orchestrator relies on.
pub trait Connection {
    /// Run one or more statements separated by semicolons, discarding results.
    fn batch_execute(&mut self, sql: &str) -> Result<()>;

    /// Run a query returning a single integer value.
    fn query_i64(&mut self, sql: &str) -> Result<i64>;

    /// Run a query whose first two columns are text.
    fn query_pairs(&mut self, sql: &str) -> Result<Vec<(String, String)>>;

    fn close(self: Box<Self>) -> Result<()>;

    fn begin(&mut self) -> Result<()> {
        self.batch_execute("BEGIN")
    }

    fn commit(&mut self) -> Result<()> {
        self.batch_execute("COMMIT")
    }

    fn rollback(&mut self) -> Result<()> {
        self.batch_execute("ROLLBACK")
    }
}

/// Opens connections to targets.
pub trait Connector {
    fn connect(&self, target: &TargetDescriptor) -> Result<Box<dyn Connection>>;
}

/// Run `f` inside a transaction: commit on success, roll back on error.
pub fn in_transaction<T, F>(conn: &mut dyn Connection, f: F) -> Result<T>
where
    F: FnOnce(&mut dyn Connection) -> Result<T>,
{
    conn.begin()?;
    match f(&mut *conn) {
        Ok(value) => {
            conn.commit()?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = conn.rollback() {
                crate::log_status!("session", "Rollback failed: {}", rollback_err.message);
            }
            Err(err)
        }
    }
}

/// What a session installs before handing over the connection.
#[derive(Debug, Clone)]
pub struct SessionPlan {
    pub extension: String,
    /// Pin the extension to this version instead of the server default.
    pub version: Option<String>,
    pub extension_requirements: Vec<String>,
    pub test_requirements: Vec<String>,
    pub recipe_schema: String,
    /// Harness definitions, executed verbatim.
    pub harness_source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connected,
    PrerequisitesEnsured,
    ExtensionReset,
    HarnessLoaded,
    Ready,
    Closed,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Disconnected => "disconnected",
            SessionState::Connected => "connected",
            SessionState::PrerequisitesEnsured => "prerequisites ensured",
            SessionState::ExtensionReset => "extension reset",
            SessionState::HarnessLoaded => "harness loaded",
            SessionState::Ready => "ready",
            SessionState::Closed => "closed",
        };
        f.write_str(name)
    }
}

pub fn require_extension_sql(extension: &str) -> String {
    format!("CREATE EXTENSION IF NOT EXISTS {} ;", quote_ident(extension))
}

pub fn version_available_sql(extension: &str, version: &str) -> String {
    format!(
        "SELECT count(*) FROM pg_catalog.pg_available_extension_versions \
         WHERE name = {} AND version = {}",
        quote_literal(extension),
        quote_literal(version)
    )
}

/// Statements that reinstall the extension, pinned or at the default version.
///
/// The unpinned reset also drops the recipe schema left by a previous run.
pub fn reset_extension_sql(extension: &str, version: Option<&str>, recipe_schema: &str) -> String {
    let extension = quote_ident(extension);
    match version {
        Some(version) => format!(
            "DROP EXTENSION IF EXISTS {ext} ;\nCREATE EXTENSION {ext} VERSION {version} ;",
            ext = extension,
            version = quote_literal(version)
        ),
        None => format!(
            "DROP EXTENSION IF EXISTS {ext} ;\nCREATE EXTENSION {ext} ;\nDROP SCHEMA IF EXISTS {schema} CASCADE ;",
            ext = extension,
            schema = quote_ident(recipe_schema)
        ),
    }
}

pub struct LifecycleSession<'t> {
    target: &'t TargetDescriptor,
    state: SessionState,
    connection: Option<Box<dyn Connection>>,
}

impl<'t> LifecycleSession<'t> {
    /// Connect and prepare `target`. On any setup error the connection is closed
    /// before the error is returned.
    pub fn open(
        connector: &dyn Connector,
        target: &'t TargetDescriptor,
        plan: &SessionPlan,
    ) -> Result<Self> {
        let mut session = Self {
            target,
            state: SessionState::Disconnected,
            connection: None,
        };

        session.connection = Some(connector.connect(target)?);
        session.advance(SessionState::Connected);

        if let Err(err) = session.prepare(plan) {
            if let Err(close_err) = session.release() {
                crate::log_status!("session", "Closing {} failed: {}", target.address(), close_err.message);
            }
            return Err(err);
        }

        session.advance(SessionState::Ready);
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn target(&self) -> &TargetDescriptor {
        self.target
    }

    pub fn connection(&mut self) -> Result<&mut dyn Connection> {
        match self.connection.as_deref_mut() {
            Some(conn) if self.state == SessionState::Ready => Ok(conn),
            _ => Err(Error::internal_unexpected(format!(
                "Session for {} is {}",
                self.target.address(),
                self.state
            ))),
        }
    }

    /// Close the connection now instead of at drop.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn advance(&mut self, next: SessionState) {
        crate::log_status!("session", "{} {}", self.target.address(), next);
        self.state = next;
    }

    fn prepare(&mut self, plan: &SessionPlan) -> Result<()> {
        let target = self.target;
        let mut reached = self.state;
        let conn = self
            .connection
            .as_deref_mut()
            .ok_or_else(|| Error::internal_unexpected("Session has no connection"))?;

        let result = in_transaction(conn, |conn| {
            for extension in plan
                .test_requirements
                .iter()
                .chain(plan.extension_requirements.iter())
            {
                conn.batch_execute(&require_extension_sql(extension))?;
            }
            reached = SessionState::PrerequisitesEnsured;

            if let Some(version) = plan.version.as_deref() {
                let available = conn.query_i64(&version_available_sql(&plan.extension, version))?;
                if available == 0 {
                    return Err(Error::extension_version_unavailable(
                        plan.extension.as_str(),
                        version,
                        target.address(),
                    ));
                }
            }
            conn.batch_execute(&reset_extension_sql(
                &plan.extension,
                plan.version.as_deref(),
                &plan.recipe_schema,
            ))?;
            reached = SessionState::ExtensionReset;

            conn.batch_execute(&plan.harness_source)?;
            reached = SessionState::HarnessLoaded;
            Ok(())
        });

        if reached != self.state {
            self.advance(reached);
        }
        result
    }

    fn release(&mut self) -> Result<()> {
        let result = match self.connection.take() {
            Some(conn) => conn.close(),
            None => Ok(()),
        };
        if self.state != SessionState::Closed {
            self.advance(SessionState::Closed);
        }
        result
    }
}

impl fmt::Debug for LifecycleSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleSession")
            .field("target", &self.target.address())
            .field("state", &self.state)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

impl Drop for LifecycleSession<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            crate::log_status!("session", "Closing {} failed: {}", self.target.address(), err.message);
        }
    }
}

/// Open a session on `target`, run `f` with its connection, then close it.
///
/// The connection is released on every path: setup failure, failure inside `f`,
/// or success. A failure while closing after `f` succeeded is logged, not returned.
pub fn with_session<T, F>(
    connector: &dyn Connector,
    target: &TargetDescriptor,
    plan: &SessionPlan,
    f: F,
) -> Result<T>
where
    F: FnOnce(&mut dyn Connection) -> Result<T>,
{
    let mut session = LifecycleSession::open(connector, target, plan)?;
    let result = session.connection().and_then(f);

    if let Err(err) = session.close() {
        crate::log_status!("session", "Closing {} failed: {}", target.address(), err.message);
    }
    result
}
