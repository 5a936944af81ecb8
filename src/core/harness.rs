//! Harness source loading and execution.
//!
//! The harness file defines, in the recipe schema, a `count_tests()` function and an
//! `execute_recette()` function returning one `(function, message)` row per failure.

use std::path::Path;

use crate::deploy::require_file;
use crate::error::Result;
use crate::report::{TestFailure, TestOutcome};
use crate::session::{in_transaction, Connection};
use crate::utils::io;
use crate::utils::sql::quote_ident;

/// Read the harness definitions.
pub fn load_harness(path: &Path) -> Result<String> {
    require_file(path)?;
    io::read_file(path, &format!("read harness {}", path.display()))
}

pub fn count_tests_sql(recipe_schema: &str) -> String {
    format!("SELECT {}.count_tests()::bigint", quote_ident(recipe_schema))
}

pub fn execute_recipe_sql(recipe_schema: &str) -> String {
    format!("SELECT * FROM {}.execute_recette()", quote_ident(recipe_schema))
}

/// Count the harness functions and run them, in one transaction.
pub fn run_recipe(conn: &mut dyn Connection, recipe_schema: &str) -> Result<TestOutcome> {
    in_transaction(conn, |conn| {
        let total = conn.query_i64(&count_tests_sql(recipe_schema))?;
        let failures = conn
            .query_pairs(&execute_recipe_sql(recipe_schema))?
            .into_iter()
            .map(TestFailure::from)
            .collect();
        Ok(TestOutcome { total, failures })
    })
}
