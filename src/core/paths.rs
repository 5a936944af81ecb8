use crate::error::{Error, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Base recette config directory (~/.config/recette/, %APPDATA%\recette on Windows)
pub fn recette() -> Result<PathBuf> {
    #[cfg(windows)]
    {
        let appdata = env::var("APPDATA").map_err(|_| {
            Error::internal_unexpected(
                "APPDATA environment variable not set on Windows".to_string(),
            )
        })?;
        Ok(PathBuf::from(appdata).join("recette"))
    }

    #[cfg(not(windows))]
    {
        let home = env::var("HOME").map_err(|_| {
            Error::internal_unexpected(
                "HOME environment variable not set on Unix-like system".to_string(),
            )
        })?;
        Ok(PathBuf::from(home).join(".config").join("recette"))
    }
}

/// Global recette.json config file path
pub fn recette_json() -> Result<PathBuf> {
    Ok(recette()?.join("recette.json"))
}

/// Harness definition file inside a distribution root
pub fn default_harness(dist_root: &Path) -> PathBuf {
    dist_root.join("recette").join("asgard_recette.sql")
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand(path: &str) -> Result<PathBuf> {
    shellexpand::full(path)
        .map(|expanded| PathBuf::from(expanded.as_ref()))
        .map_err(|e| Error::validation_invalid_argument("path", e.to_string()))
}
