//! PostgreSQL implementation of the session connection traits.

use postgres::{Client, NoTls};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::session::{Connection, Connector};
use crate::target::TargetDescriptor;

const APPLICATION_NAME: &str = "recette";

/// Connects with the `postgres` client, without TLS.
#[derive(Debug, Clone, Default)]
pub struct PgConnector {
    pub connect_timeout: Option<Duration>,
}

impl PgConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    fn config(&self, target: &TargetDescriptor) -> postgres::Config {
        let mut config = postgres::Config::new();
        config
            .host(target.host())
            .port(target.port())
            .dbname(target.dbname())
            .user(target.user())
            .password(target.password())
            .application_name(APPLICATION_NAME);
        if let Some(timeout) = self.connect_timeout {
            config.connect_timeout(timeout);
        }
        config
    }
}

impl Connector for PgConnector {
    fn connect(&self, target: &TargetDescriptor) -> Result<Box<dyn Connection>> {
        let client = self
            .config(target)
            .connect(NoTls)
            .map_err(|e| Error::db_connect_failed(target.address(), e.to_string()))?;

        Ok(Box::new(PgConnection {
            client,
            address: target.address(),
        }))
    }
}

pub struct PgConnection {
    client: Client,
    address: String,
}

impl PgConnection {
    fn map_error(&self, err: postgres::Error, context: &str) -> Error {
        if err.is_closed() {
            return Error::db_connection_lost(self.address.as_str(), err.to_string());
        }
        match err.as_db_error() {
            Some(db) => Error::db_statement_failed(
                db.message(),
                Some(db.code().code().to_string()),
                Some(context.to_string()),
            ),
            None => Error::db_statement_failed(err.to_string(), None, Some(context.to_string())),
        }
    }
}

/// First line of a statement, for error context.
fn statement_head(sql: &str) -> String {
    sql.trim().lines().next().unwrap_or_default().to_string()
}

impl Connection for PgConnection {
    fn batch_execute(&mut self, sql: &str) -> Result<()> {
        self.client
            .batch_execute(sql)
            .map_err(|e| self.map_error(e, &statement_head(sql)))
    }

    fn query_i64(&mut self, sql: &str) -> Result<i64> {
        let row = self
            .client
            .query_one(sql, &[])
            .map_err(|e| self.map_error(e, &statement_head(sql)))?;
        row.try_get::<_, i64>(0)
            .map_err(|e| self.map_error(e, &statement_head(sql)))
    }

    fn query_pairs(&mut self, sql: &str) -> Result<Vec<(String, String)>> {
        let rows = self
            .client
            .query(sql, &[])
            .map_err(|e| self.map_error(e, &statement_head(sql)))?;

        rows.iter()
            .map(|row| {
                let first = row
                    .try_get::<_, Option<String>>(0)
                    .map_err(|e| self.map_error(e, &statement_head(sql)))?;
                let second = row
                    .try_get::<_, Option<String>>(1)
                    .map_err(|e| self.map_error(e, &statement_head(sql)))?;
                Ok((first.unwrap_or_default(), second.unwrap_or_default()))
            })
            .collect()
    }

    fn close(self: Box<Self>) -> Result<()> {
        let PgConnection { client, address } = *self;
        client
            .close()
            .map_err(|e| Error::db_connection_lost(address, e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_head_takes_first_line() {
        assert_eq!(
            statement_head("\n  DROP EXTENSION IF EXISTS \"asgard\" ;\nCREATE EXTENSION \"asgard\" ;"),
            "DROP EXTENSION IF EXISTS \"asgard\" ;"
        );
        assert_eq!(statement_head(""), "");
    }
}
