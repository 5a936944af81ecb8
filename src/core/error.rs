use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigInvalidJson,
    ConfigInvalidValue,

    ValidationInvalidArgument,

    PathNotFound,
    PathNotExpectedType,

    DbConnectFailed,
    DbConnectionLost,
    DbStatementFailed,

    ExtensionVersionUnavailable,

    KeychainError,

    InternalIoError,
    InternalJsonError,
    InternalUnexpected,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ConfigInvalidJson => "config.invalid_json",
            ErrorCode::ConfigInvalidValue => "config.invalid_value",

            ErrorCode::ValidationInvalidArgument => "validation.invalid_argument",

            ErrorCode::PathNotFound => "path.not_found",
            ErrorCode::PathNotExpectedType => "path.not_expected_type",

            ErrorCode::DbConnectFailed => "db.connect_failed",
            ErrorCode::DbConnectionLost => "db.connection_lost",
            ErrorCode::DbStatementFailed => "db.statement_failed",

            ErrorCode::ExtensionVersionUnavailable => "extension.version_unavailable",

            ErrorCode::KeychainError => "keychain.error",

            ErrorCode::InternalIoError => "internal.io_error",
            ErrorCode::InternalJsonError => "internal.json_error",
            ErrorCode::InternalUnexpected => "internal.unexpected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hint {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidJsonDetails {
    pub path: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInvalidValueDetails {
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvalidArgumentDetails {
    pub field: String,
    pub problem: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathDetails {
    pub path: String,
    pub expected: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetails {
    pub target: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementFailedDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sqlstate: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionUnavailableDetails {
    pub extension: String,
    pub version: String,
    pub target: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalIoErrorDetails {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub code: ErrorCode,
    pub message: String,
    pub details: Value,
    pub hints: Vec<Hint>,
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}

fn to_details<T: Serialize>(details: T) -> Value {
    serde_json::to_value(details).unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
}

impl Error {
    pub fn new(code: ErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            hints: Vec::new(),
        }
    }

    pub fn validation_invalid_argument(
        field: impl Into<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(InvalidArgumentDetails {
            field: field.into(),
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ValidationInvalidArgument,
            "Invalid argument",
            details,
        )
    }

    pub fn config_invalid_json(path: impl Into<String>, err: serde_json::Error) -> Self {
        let details = to_details(ConfigInvalidJsonDetails {
            path: path.into(),
            error: err.to_string(),
        });

        Self::new(
            ErrorCode::ConfigInvalidJson,
            "Invalid JSON in configuration",
            details,
        )
    }

    pub fn config_invalid_value(
        key: impl Into<String>,
        value: Option<String>,
        problem: impl Into<String>,
    ) -> Self {
        let details = to_details(ConfigInvalidValueDetails {
            key: key.into(),
            value,
            problem: problem.into(),
        });

        Self::new(
            ErrorCode::ConfigInvalidValue,
            "Invalid configuration value",
            details,
        )
    }

    /// A required file or directory does not exist.
    pub fn not_found(path: impl Into<String>, expected: &str) -> Self {
        let path = path.into();
        let message = format!("Can't find {} {}", expected, path);
        Self::new(
            ErrorCode::PathNotFound,
            message,
            to_details(PathDetails {
                path,
                expected: expected.to_string(),
            }),
        )
    }

    /// A path exists but is not the kind of entry the operation needs.
    pub fn not_expected_type(path: impl Into<String>, expected: &str) -> Self {
        let path = path.into();
        let message = format!("{} is not a {}", path, expected);
        Self::new(
            ErrorCode::PathNotExpectedType,
            message,
            to_details(PathDetails {
                path,
                expected: expected.to_string(),
            }),
        )
    }

    pub fn db_connect_failed(target: impl Into<String>, error: impl Into<String>) -> Self {
        let target = target.into();
        Self::new(
            ErrorCode::DbConnectFailed,
            format!("Could not connect to {}", target),
            to_details(ConnectionDetails {
                target,
                error: error.into(),
            }),
        )
        .with_hint("Check that the server is running and that the role and password are correct")
    }

    pub fn db_connection_lost(target: impl Into<String>, error: impl Into<String>) -> Self {
        let target = target.into();
        Self::new(
            ErrorCode::DbConnectionLost,
            format!("Connection to {} was lost", target),
            to_details(ConnectionDetails {
                target,
                error: error.into(),
            }),
        )
    }

    pub fn db_statement_failed(
        error: impl Into<String>,
        sqlstate: Option<String>,
        context: Option<String>,
    ) -> Self {
        let error = error.into();
        Self::new(
            ErrorCode::DbStatementFailed,
            format!("SQL statement failed: {}", error),
            to_details(StatementFailedDetails {
                error,
                sqlstate,
                context,
            }),
        )
    }

    pub fn extension_version_unavailable(
        extension: impl Into<String>,
        version: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let extension = extension.into();
        let version = version.into();
        Self::new(
            ErrorCode::ExtensionVersionUnavailable,
            format!(
                "Extension {} has no version {} on this server",
                extension, version
            ),
            to_details(VersionUnavailableDetails {
                extension,
                version,
                target: target.into(),
            }),
        )
        .with_hint("Deploy the matching definition scripts or drop --skip-deploy")
    }

    pub fn keychain(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::KeychainError,
            format!("Keychain error: {}", error.into()),
            Value::Null,
        )
    }

    pub fn internal_io(error: impl Into<String>, context: Option<String>) -> Self {
        let details = to_details(InternalIoErrorDetails {
            error: error.into(),
            context,
        });

        Self::new(ErrorCode::InternalIoError, "IO error", details)
    }

    pub fn internal_json(error: impl Into<String>, context: Option<String>) -> Self {
        let details = serde_json::json!({
            "error": error.into(),
            "context": context,
        });

        Self::new(ErrorCode::InternalJsonError, "JSON error", details)
    }

    pub fn internal_unexpected(error: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::InternalUnexpected,
            "Unexpected error",
            serde_json::json!({ "error": error.into() }),
        )
    }

    pub fn with_hint(mut self, message: impl Into<String>) -> Self {
        self.hints.push(Hint {
            message: message.into(),
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_path_details() {
        let err = Error::not_found("/tmp/missing.sql", "file");
        assert_eq!(err.code.as_str(), "path.not_found");
        assert_eq!(err.message, "Can't find file /tmp/missing.sql");
        assert_eq!(err.details["path"], "/tmp/missing.sql");
    }

    #[test]
    fn version_unavailable_has_hint() {
        let err = Error::extension_version_unavailable("asgard", "0.0.1", "localhost:5432");
        assert_eq!(err.code, ErrorCode::ExtensionVersionUnavailable);
        assert_eq!(err.hints.len(), 1);
        assert_eq!(err.details["version"], "0.0.1");
    }
}
