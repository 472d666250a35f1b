/// Version folder handling for intermediate outputs.
///
/// Each pipeline run works inside `<root>/<title>/vMM.mm.pp`. On
/// startup the workload root is scanned: the highest existing version
/// names the folder the external extractor last wrote into, and the
/// next patch after it is where this run's artifacts go.
use std::path::Path;

use crate::error::CliError;

/// The version folders relevant to one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDirs {
    /// Highest existing version folder name, if any — the input side.
    pub current: Option<String>,
    /// Fresh folder name for this run's outputs: the next patch after
    /// `current`, or the initial version when none exists.
    pub next: String,
}

/// Scans `workload_root` for `vMM.mm.pp` folders.
///
/// A missing workload root is not an error: it simply means no version
/// exists yet.
///
/// # Errors
///
/// [`CliError::VersionScan`] when the root exists but cannot be read.
pub fn scan_version_dirs(workload_root: &Path) -> Result<VersionDirs, CliError> {
    let mut latest: Option<(u32, u32, u32)> = None;

    if workload_root.is_dir() {
        let entries = std::fs::read_dir(workload_root).map_err(|e| CliError::VersionScan {
            path: workload_root.to_path_buf(),
            detail: e.to_string(),
        })?;
        for entry in entries {
            let entry = entry.map_err(|e| CliError::VersionScan {
                path: workload_root.to_path_buf(),
                detail: e.to_string(),
            })?;
            if !entry.path().is_dir() {
                continue;
            }
            if let Some(version) = parse_version(&entry.file_name().to_string_lossy()) {
                if latest.is_none_or(|best| version > best) {
                    latest = Some(version);
                }
            }
        }
    }

    let next = match latest {
        Some((major, minor, patch)) => format_version(major, minor, patch + 1),
        None => format_version(1, 0, 0),
    };
    Ok(VersionDirs {
        current: latest.map(|(major, minor, patch)| format_version(major, minor, patch)),
        next,
    })
}

/// Parses a `vMM.mm.pp` folder name. Digit counts are not enforced so
/// hand-made folders like `v1.2.3` still sort in.
fn parse_version(name: &str) -> Option<(u32, u32, u32)> {
    let rest = name.strip_prefix('v')?;
    let mut parts = rest.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

fn format_version(major: u32, minor: u32, patch: u32) -> String {
    format!("v{major:02}.{minor:02}.{patch:02}")
}
