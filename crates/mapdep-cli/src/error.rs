/// CLI error types with associated exit codes.
///
/// [`CliError`] is the top-level error type for the `mapdep` binary.
/// Every variant maps to a stable exit code via [`CliError::exit_code`]:
///
/// - Exit code **2** — structural failure: the tool could not resolve
///   its configuration or inputs at all, or could not write its
///   outputs. Nothing meaningful was derived.
/// - Exit code **1** — data-quality failure: the pipeline ran, but the
///   inputs are degraded (accumulated error diagnostics) or admit no
///   run plan (cyclic flow, no flow).
use std::fmt;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CliError
// ---------------------------------------------------------------------------

/// All error conditions the `mapdep` CLI can produce.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: structural failures ---
    /// The configuration file could not be read.
    ConfigRead {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error message.
        detail: String,
    },

    /// The configuration file is not valid TOML or misses required keys.
    ConfigParse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Parser error message.
        detail: String,
    },

    /// The workload root could not be scanned for version folders.
    VersionScan {
        /// The directory that failed to scan.
        path: PathBuf,
        /// Underlying I/O error message.
        detail: String,
    },

    /// No extracted inputs: either the configuration names no
    /// PowerDesigner files or no version folder holds extractor output.
    NoInputFiles,

    /// One or more RETW files could not be read or decoded.
    ///
    /// Per-file details have already been reported through the
    /// diagnostic channel.
    IngestFailed,

    /// A derived artifact could not be written.
    OutputWrite {
        /// The output path that failed.
        path: PathBuf,
        /// Underlying I/O error message.
        detail: String,
    },

    // --- Exit code 1: data-quality failures ---
    /// Run-plan derivation failed (cyclic flow or no flow).
    RunPlanFailed {
        /// The engine's failure description.
        detail: String,
    },

    /// The pipeline completed but the diagnostic sink accumulated one
    /// or more errors.
    IssuesFound {
        /// Number of error-severity diagnostics.
        qty_errors: usize,
    },
}

impl CliError {
    /// Returns the process exit code for this error.
    ///
    /// - `2` — structural failure (bad config, unreadable inputs, …).
    /// - `1` — data-quality failure (degraded inputs, no run plan).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigRead { .. }
            | Self::ConfigParse { .. }
            | Self::VersionScan { .. }
            | Self::NoInputFiles
            | Self::IngestFailed
            | Self::OutputWrite { .. } => 2,

            Self::RunPlanFailed { .. } | Self::IssuesFound { .. } => 1,
        }
    }

    /// Returns the human-readable message printed to stderr before
    /// exiting.
    pub fn message(&self) -> String {
        match self {
            Self::ConfigRead { path, detail } => {
                format!("error: could not read config file {}: {detail}", path.display())
            }
            Self::ConfigParse { path, detail } => {
                format!("error: invalid config file {}: {detail}", path.display())
            }
            Self::VersionScan { path, detail } => {
                format!(
                    "error: could not scan version folders under {}: {detail}",
                    path.display()
                )
            }
            Self::NoInputFiles => "error: no RETW input files to process".to_owned(),
            Self::IngestFailed => {
                "error: one or more RETW files could not be ingested".to_owned()
            }
            Self::OutputWrite { path, detail } => {
                format!("error: could not write {}: {detail}", path.display())
            }
            Self::RunPlanFailed { detail } => {
                format!("error: run-plan derivation failed: {detail}")
            }
            Self::IssuesFound { qty_errors } => {
                format!("error: {qty_errors} issue(s) found while processing RETW files")
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn structural_failures_are_exit_2() {
        let errors = [
            CliError::ConfigRead {
                path: PathBuf::from("mapdep.toml"),
                detail: "gone".to_owned(),
            },
            CliError::ConfigParse {
                path: PathBuf::from("mapdep.toml"),
                detail: "bad".to_owned(),
            },
            CliError::VersionScan {
                path: PathBuf::from("out"),
                detail: "denied".to_owned(),
            },
            CliError::NoInputFiles,
            CliError::IngestFailed,
            CliError::OutputWrite {
                path: PathBuf::from("x.json"),
                detail: "full".to_owned(),
            },
        ];
        for e in errors {
            assert_eq!(e.exit_code(), 2, "{e}");
        }
    }

    #[test]
    fn data_quality_failures_are_exit_1() {
        assert_eq!(
            CliError::RunPlanFailed {
                detail: "no mappings".to_owned()
            }
            .exit_code(),
            1
        );
        assert_eq!(CliError::IssuesFound { qty_errors: 3 }.exit_code(), 1);
    }

    #[test]
    fn messages_name_the_offending_path() {
        let e = CliError::ConfigParse {
            path: PathBuf::from("conf/mapdep.toml"),
            detail: "missing field `title`".to_owned(),
        };
        let msg = e.message();
        assert!(msg.contains("conf/mapdep.toml"), "{msg}");
        assert!(msg.contains("missing field `title`"), "{msg}");
    }

    #[test]
    fn issues_found_counts_errors() {
        let msg = CliError::IssuesFound { qty_errors: 7 }.message();
        assert!(msg.contains('7'), "{msg}");
    }

    #[test]
    fn display_matches_message() {
        let e = CliError::NoInputFiles;
        assert_eq!(format!("{e}"), e.message());
    }
}
