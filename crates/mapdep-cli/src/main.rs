pub mod config;
pub mod error;
pub mod pipeline;
pub mod versioning;

use std::path::PathBuf;

use clap::Parser;

/// Derive ETL run plans and dependency views from RETW model extracts.
///
/// Reads the workload configuration, ingests the extracted RETW files
/// of the latest version folder, and writes `mapping_order.json` and
/// `file_dependencies.json` into the next version folder.
#[derive(Parser)]
#[command(name = "mapdep", version)]
struct Cli {
    /// Path to the workload configuration file (TOML).
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Resolve the configuration and version folders and report the
    /// planned work without ingesting or writing anything.
    #[arg(long)]
    dry_run: bool,
}

fn main() {
    #[cfg(unix)]
    install_sigpipe_default();

    init_tracing();

    let cli = Cli::parse();
    if let Err(e) = pipeline::run(&cli.config, cli.dry_run) {
        eprintln!("{}", e.message());
        std::process::exit(e.exit_code());
    }
}

/// Installs the stderr log subscriber. Quiet by default; `RUST_LOG`
/// opts into more.
fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Resets `SIGPIPE` to its default disposition (`SIG_DFL`).
///
/// Rust's runtime ignores `SIGPIPE` by default, which causes programs
/// that write to a closed pipe (e.g. `mapdep conf.toml | head`) to
/// receive an `Err(BrokenPipe)` from a write call rather than being
/// terminated silently. Restoring the default disposition lets the
/// kernel terminate the process the standard Unix way.
#[cfg(unix)]
fn install_sigpipe_default() {
    // SAFETY: signal() is safe to call during single-threaded program
    // initialization before any other threads are spawned. SIG_DFL is
    // a valid handler for SIGPIPE. The return value (previous handler)
    // is discarded.
    //
    // The workspace denies `unsafe_code` globally; this is the minimal
    // unavoidable use of libc required for SIGPIPE handling on Unix,
    // scoped with an inline allow so the exception stays as narrow as
    // possible.
    #[allow(unsafe_code)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
}
