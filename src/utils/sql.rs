//! SQL identifier and literal quoting for statements built from configuration.
//!
//! DDL such as `CREATE EXTENSION ... VERSION` cannot take bind parameters, so names and
//! versions are quoted client-side the way PostgreSQL's `quote_ident` and
//! `quote_literal` do.

/// Quote an identifier: wrap in double quotes, doubling embedded quotes.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a string literal: wrap in single quotes, doubling embedded quotes.
///
/// Backslashes are doubled and the `E''` form is used when present, so the result is
/// safe whatever `standard_conforming_strings` is set to.
pub fn quote_literal(value: &str) -> String {
    let escaped = value.replace('\'', "''");
    if escaped.contains('\\') {
        format!("E'{}'", escaped.replace('\\', "\\\\"))
    } else {
        format!("'{}'", escaped)
    }
}
