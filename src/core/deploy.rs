//! Extension artifact deployment.
//!
//! Copies definition scripts and control files from the distribution root into a
//! server's extension directory.

use glob_match::glob_match;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::utils::io;

/// Files copied to one target.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployResult {
    pub target_dir: Option<PathBuf>,
    pub files: Vec<String>,
}

/// Fail unless `path` is an existing regular file.
pub fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::not_found(path.display().to_string(), "file"));
    }
    if !path.is_file() {
        return Err(Error::not_expected_type(path.display().to_string(), "file"));
    }
    Ok(())
}

/// Fail unless `path` is an existing directory.
pub fn require_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(Error::not_found(path.display().to_string(), "directory"));
    }
    if !path.is_dir() {
        return Err(Error::not_expected_type(
            path.display().to_string(),
            "directory",
        ));
    }
    Ok(())
}

fn file_name(path: &Path) -> Result<&std::ffi::OsStr> {
    path.file_name()
        .ok_or_else(|| Error::not_expected_type(path.display().to_string(), "file"))
}

/// Copy one file into `target_dir`, overwriting a file of the same name.
pub fn copy_file(source: &Path, target_dir: &Path) -> Result<PathBuf> {
    copy_files(&[source], target_dir).map(|mut copied| copied.remove(0))
}

/// Copy files into `target_dir` in order.
///
/// Every source and the directory are checked before anything is written.
/// Content is read and written as UTF-8 text; existing files are overwritten in place.
pub fn copy_files<P: AsRef<Path>>(sources: &[P], target_dir: &Path) -> Result<Vec<PathBuf>> {
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    for source in sources {
        let source = source.as_ref();
        require_file(source)?;
        file_name(source)?;
    }
    require_dir(target_dir)?;

    let mut copied = Vec::with_capacity(sources.len());
    for source in sources {
        let source = source.as_ref();
        let content = io::read_file(source, &format!("read {}", source.display()))?;
        let target = target_dir.join(file_name(source)?);
        io::write_file(&target, &content, &format!("write {}", target.display()))?;
        copied.push(target);
    }

    Ok(copied)
}

/// Top-level regular files of `dist_root` whose name matches one of `patterns`,
/// sorted by file name.
pub fn collect_artifacts(dist_root: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    require_dir(dist_root)?;

    let entries = fs::read_dir(dist_root).map_err(|e| {
        Error::internal_io(e.to_string(), Some(format!("list {}", dist_root.display())))
    })?;

    let mut artifacts: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| patterns.iter().any(|p| glob_match(p, name)))
        })
        .collect();

    artifacts.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(artifacts)
}

/// Copy every artifact of `dist_root` into `target_dir`.
pub fn deploy_artifacts(
    dist_root: &Path,
    patterns: &[String],
    target_dir: &Path,
) -> Result<DeployResult> {
    let artifacts = collect_artifacts(dist_root, patterns)?;
    crate::log_status!(
        "deploy",
        "Copying {} file(s) to {}",
        artifacts.len(),
        target_dir.display()
    );

    let copied = copy_files(&artifacts, target_dir)?;
    Ok(DeployResult {
        target_dir: Some(target_dir.to_path_buf()),
        files: copied
            .iter()
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect(),
    })
}
