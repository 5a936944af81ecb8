use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::defaults::{
    extension_dir_from_template, DEFAULT_DBNAME, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_USER,
};
use crate::error::Result;
use crate::paths;

/// One configured database server, as written in recette.json.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Server variant under test (the PostgreSQL major version).
    pub version: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_dbname")]
    pub dbname: String,

    /// Connection role. Must be a superuser.
    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_dir: Option<String>,

    /// Never deploy to this target; files are installed by hand.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub do_not_copy: bool,
}

fn format_identity(version: &str, host: &str, port: u16, dbname: &str) -> String {
    format!("< PostgreSQL {} - {}:{} {} >", version, host, port, dbname)
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_dbname() -> String {
    DEFAULT_DBNAME.to_string()
}

fn default_user() -> String {
    DEFAULT_USER.to_string()
}

impl TargetConfig {
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            host: default_host(),
            port: default_port(),
            dbname: default_dbname(),
            user: default_user(),
            password: None,
            extension_dir: None,
            do_not_copy: false,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn identity(&self) -> String {
        format_identity(&self.version, &self.host, self.port, &self.dbname)
    }

    /// Deployment directory for this target, or `None` when deployment is suppressed
    /// or nothing is configured.
    pub fn resolve_extension_dir(&self, template: Option<&str>) -> Result<Option<PathBuf>> {
        if self.do_not_copy {
            return Ok(None);
        }

        let raw = match (&self.extension_dir, template) {
            (Some(dir), _) => dir.clone(),
            (None, Some(template)) => extension_dir_from_template(template, &self.version),
            (None, None) => return Ok(None),
        };

        paths::expand(&raw).map(Some)
    }
}

impl fmt::Debug for TargetConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetConfig")
            .field("version", &self.version)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("extension_dir", &self.extension_dir)
            .field("do_not_copy", &self.do_not_copy)
            .finish()
    }
}

/// A resolved target: configuration plus a non-empty password.
///
/// Built by the registry, immutable afterwards. The sequence number keeps two
/// identically configured entries distinct.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct TargetDescriptor {
    #[serde(skip)]
    sequence: u64,
    version: String,
    host: String,
    port: u16,
    dbname: String,
    user: String,
    #[serde(skip)]
    password: String,
    extension_dir: Option<PathBuf>,
    skip_deploy: bool,
}

impl TargetDescriptor {
    /// Build a descriptor from its configuration and an already resolved password.
    pub fn new(
        config: &TargetConfig,
        password: impl Into<String>,
        extension_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            sequence: 0,
            version: config.version.clone(),
            host: config.host.clone(),
            port: config.port,
            dbname: config.dbname.clone(),
            user: config.user.clone(),
            password: password.into(),
            extension_dir: if config.do_not_copy {
                None
            } else {
                extension_dir
            },
            skip_deploy: config.do_not_copy,
        }
    }

    pub(crate) fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn dbname(&self) -> &str {
        &self.dbname
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Where extension files go. Always `None` when deployment is suppressed.
    pub fn extension_dir(&self) -> Option<&Path> {
        self.extension_dir.as_deref()
    }

    pub fn skip_deploy(&self) -> bool {
        self.skip_deploy
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Human-readable identity printed above each target's results.
    pub fn identity(&self) -> String {
        format_identity(&self.version, &self.host, self.port, &self.dbname)
    }
}

impl fmt::Display for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identity())
    }
}

impl fmt::Debug for TargetDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetDescriptor")
            .field("sequence", &self.sequence)
            .field("version", &self.version)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("extension_dir", &self.extension_dir)
            .field("skip_deploy", &self.skip_deploy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_names_version_and_address() {
        let config = TargetConfig {
            port: 5437,
            ..TargetConfig::new("15")
        };
        let target = TargetDescriptor::new(&config, "secret", None);
        assert_eq!(target.identity(), "< PostgreSQL 15 - localhost:5437 asgard_rec >");
        assert_eq!(target.to_string(), target.identity());
    }

    #[test]
    fn do_not_copy_drops_extension_dir() {
        let config = TargetConfig {
            extension_dir: Some("/pg/15/extension".into()),
            do_not_copy: true,
            ..TargetConfig::new("15")
        };
        assert_eq!(config.resolve_extension_dir(None).unwrap(), None);

        let target = TargetDescriptor::new(&config, "secret", Some(PathBuf::from("/pg/15")));
        assert!(target.skip_deploy());
        assert_eq!(target.extension_dir(), None);
    }

    #[test]
    fn template_fills_missing_extension_dir() {
        let config = TargetConfig::new("14");
        let dir = config
            .resolve_extension_dir(Some("/opt/pg/{{version}}/share/extension"))
            .unwrap();
        assert_eq!(dir, Some(PathBuf::from("/opt/pg/14/share/extension")));
    }

    #[test]
    fn explicit_extension_dir_wins_over_template() {
        let config = TargetConfig {
            extension_dir: Some("/custom".into()),
            ..TargetConfig::new("14")
        };
        let dir = config.resolve_extension_dir(Some("/opt/{{version}}")).unwrap();
        assert_eq!(dir, Some(PathBuf::from("/custom")));
    }

    #[test]
    fn debug_output_hides_password() {
        let config = TargetConfig {
            password: Some("hunter2".into()),
            ..TargetConfig::new("13")
        };
        let target = TargetDescriptor::new(&config, "hunter2", None);
        assert!(!format!("{:?}", config).contains("hunter2"));
        assert!(!format!("{:?}", target).contains("hunter2"));
        assert!(!serde_json::to_string(&config).unwrap().contains("hunter2"));
        assert!(!serde_json::to_string(&target).unwrap().contains("hunter2"));
    }
}
