//! File Uploader - Command-line interface for the upload engine.
//!
//! Parses arguments, layers configuration, installs logging and prints
//! progress and the final summary. Exits with 0 only when every upload
//! succeeded.

mod options;
mod output;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use engine::{HttpConnector, ProgressCallback, UploadSession, UploadSummary};
use options::Args;
use output::{format_bytes, CliProgress, Verbosity};
use settings::{config_dir, default_config_dir, list_profiles, FileSettings};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let args = Args::parse();
    if let Err(e) = init_tracing(
        Verbosity::from_flags(args.verbose, args.quiet),
        args.log_file.as_deref(),
    ) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    let exit_code = match run_cli(&args) {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(exit_code);
}

/// Install the stderr subscriber, plus a plain-text copy into `log_file` if
/// one is given. `RUST_LOG` overrides the verbosity flags.
fn init_tracing(verbosity: Verbosity, log_file: Option<&Path>) -> Result<()> {
    let default_filter = match verbosity {
        Verbosity::Quiet => "error",
        Verbosity::Normal => "engine=info,warn",
        Verbosity::Verbose => "engine=debug,info",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let file_layer = match log_file {
        Some(path) => Some(
            fmt::layer()
                .with_writer(Mutex::new(open_log_file(path)?))
                .with_ansi(false)
                .with_target(false),
        ),
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// Open `path` for appending, creating it if needed.
fn open_log_file(path: &Path) -> Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Cannot open log file {}", path.display()))
}

/// Main CLI logic - separated for testability
///
/// Returns whether the run counts as a success.
fn run_cli(args: &Args) -> Result<bool> {
    let settings = FileSettings::load(
        args.config.as_deref(),
        args.profile.as_deref(),
        default_config_dir().as_deref(),
    )?;

    if args.list_profiles {
        let dir = config_dir(args.config.as_deref(), default_config_dir().as_deref())
            .context("No configuration directory to look up profiles in")?;
        print_profiles(&mut io::stdout().lock(), &dir, &list_profiles(&dir)?)?;
        return Ok(true);
    }

    let target = args
        .target
        .as_deref()
        .context("No file or directory to upload")?;
    let config = settings.into_uploader_config(args);
    let verbosity = Verbosity::from_flags(args.verbose, args.quiet);

    let connector = HttpConnector::new(&config);
    let progress: Arc<dyn ProgressCallback> = Arc::new(CliProgress::new(verbosity, args.json));
    let session = UploadSession::new(config, connector, Some(progress))
        .context("Invalid configuration")?;

    if verbosity == Verbosity::Verbose && !args.json {
        print_banner(&mut io::stdout().lock(), &session, target, &args.subdir)?;
    }

    if args.dry_run {
        return dry_run(&mut io::stdout().lock(), &session, target, args);
    }

    let summary = session
        .run(target, &args.subdir)
        .with_context(|| format!("Cannot upload '{}'", target.display()))?;
    Ok(exit_code(&summary) == 0)
}

fn print_banner(
    out: &mut impl Write,
    session: &UploadSession<HttpConnector>,
    target: &Path,
    subdir: &str,
) -> Result<()> {
    let config = session.config();
    writeln!(out, "Session: {}", session.id())?;
    writeln!(out, "API URL: {}", config.endpoint)?;
    writeln!(out, "Target: {}", target.display())?;
    if !subdir.is_empty() {
        writeln!(out, "Subdirectory: {}", subdir)?;
    }
    if !config.include.is_empty() {
        writeln!(out, "Include: {}", config.include.join(","))?;
    }
    if !config.exclude.is_empty() {
        writeln!(out, "Exclude: {}", config.exclude.join(","))?;
    }
    writeln!(out)?;
    Ok(())
}

fn print_profiles(out: &mut impl Write, dir: &Path, profiles: &[String]) -> Result<()> {
    if profiles.is_empty() {
        writeln!(out, "No profiles in {}", dir.join("profiles").display())?;
    } else {
        writeln!(out, "Available profiles: {}", profiles.join(", "))?;
    }
    Ok(())
}

fn dry_run(
    out: &mut impl Write,
    session: &UploadSession<HttpConnector>,
    target: &Path,
    args: &Args,
) -> Result<bool> {
    let plan = session
        .plan(target, &args.subdir)
        .with_context(|| format!("Cannot plan '{}'", target.display()))?;

    if args.json {
        writeln!(
            out,
            "{}",
            serde_json::to_string_pretty(&plan).context("Cannot encode plan as JSON")?
        )?;
        return Ok(true);
    }

    let mut total_bytes = 0;
    for planned in &plan {
        total_bytes += planned.size;
        if planned.job.subdir.is_empty() {
            writeln!(
                out,
                "{} ({})",
                planned.job.path.display(),
                format_bytes(planned.size)
            )?;
        } else {
            writeln!(
                out,
                "{} ({}) → {}",
                planned.job.path.display(),
                format_bytes(planned.size),
                planned.job.subdir
            )?;
        }
    }
    writeln!(
        out,
        "\nDry run: {} files, {} would be uploaded",
        plan.len(),
        format_bytes(total_bytes)
    )?;
    Ok(true)
}

/// Process exit code for a finished session.
fn exit_code(summary: &UploadSummary) -> i32 {
    if summary.is_success() {
        0
    } else {
        1
    }
}
