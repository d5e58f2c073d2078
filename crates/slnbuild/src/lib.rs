//! # slnbuild
//!
//! Command-line tool that builds one driver sample solution for one
//! configuration/platform pair through MSBuild.
//!
//! ## Quick Start
//!
//! ```bash
//! # Build a sample with the defaults (Debug|x64, logs in the current directory)
//! slnbuild build usb/kmdf_fx2
//!
//! # Release|arm64, logs collected under ./logs
//! slnbuild build usb/kmdf_fx2 -c Release -p arm64 --log-dir logs
//!
//! # Show which pairs a sample's solution declares
//! slnbuild configs usb/kmdf_fx2
//!
//! # Write a starter slnbuild.toml
//! slnbuild init
//! ```
//!
//! ## Exit Codes
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Build succeeded |
//! | 1 | MSBuild missing, directory or solution missing, or the build failed |
//! | 2 | Skipped: the solution does not declare the requested configuration/platform |
//!
//! Drivers that fan out over many samples should count code 2 separately from
//! failures.
//!
//! ## Global Flags
//!
//! - **`--verbose` / `-v`** - Debug logging, and point at the error log when a build fails
//! - **`--dry-run`** - Print the MSBuild command line instead of running it
//! - **`--config <PATH>`** - Use an explicit `slnbuild.toml`
//!
//! ## Environment
//!
//! - `WDS_WipeOutputs` - when set, remove `x64`/`arm64` output folders after a
//!   successful build. Also read from `.env` / `.env.local`.
//! - `RUST_LOG` - overrides the log filter.

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use slnbuild_sdk::{BuildOutcome, BuildRequest, MsBuild, SampleBuilder, solution};

pub mod config;

use config::{CONFIG_FILE_NAME, ConfigResolver, SlnbuildConfig};

/// Environment variable enabling post-build output cleanup.
pub const WIPE_OUTPUTS_ENV: &str = "WDS_WipeOutputs";

/// Build one driver sample solution for one configuration/platform pair.
#[derive(Parser, Debug)]
#[command(name = "slnbuild", author, version, about = "Driver sample build wrapper around MSBuild", long_about = None)]
pub struct Cli {
    /// Print the MSBuild command line without running it
    #[arg(long, global = true)]
    dry_run: bool,

    /// Print verbose output, including the error log location of failed builds
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Path to a slnbuild.toml (default: discovered from the current directory upward)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the solution in a sample directory.
    Build {
        /// Directory containing the sample's .sln file
        directory: PathBuf,
        #[arg(long, help = "Name used for log files (default: derived from the directory)")]
        sample_name: Option<String>,
        #[arg(long, short = 'c', help = "Configuration to build [default: Debug]")]
        configuration: Option<String>,
        #[arg(long, short = 'p', help = "Platform to build [default: x64]")]
        platform: Option<String>,
        #[arg(long, help = "Directory for .err/.wrn/.out logs [default: current directory]")]
        log_dir: Option<PathBuf>,
        #[arg(long, help = "MSBuild executable (default: msbuild on PATH)")]
        msbuild: Option<PathBuf>,
        #[arg(long, help = "Remove x64/arm64 output folders after a successful build")]
        wipe_outputs: bool,
        #[arg(long, help = "Write a JSON summary of the outcome to this path")]
        summary: Option<PathBuf>,
    },
    /// List the configuration/platform pairs a sample's solution declares.
    Configs {
        /// Directory containing the sample's .sln file
        directory: PathBuf,
    },
    /// Write a starter slnbuild.toml.
    Init {
        #[arg(long, default_value = CONFIG_FILE_NAME)]
        output: PathBuf,
    },
}

#[derive(Debug, Serialize)]
struct BuildSummary<'a> {
    directory: &'a Path,
    generated_at: String,
    exit_code: u8,
    outcome: &'a BuildOutcome,
}

/// Parses the command line and runs it, returning the process exit code.
pub fn run() -> Result<u8> {
    load_dotenv();
    let cli = Cli::parse();
    init_logging(cli.verbose);
    execute(cli)
}

fn execute(cli: Cli) -> Result<u8> {
    match cli.command {
        Command::Build {
            directory,
            sample_name,
            configuration,
            platform,
            log_dir,
            msbuild,
            wipe_outputs,
            summary,
        } => {
            let resolver = ConfigResolver::new(cli.config.as_deref())?;
            if let Some(path) = &resolver.config_path {
                log::debug!("Using config file {:?}", path);
            }

            let tool = match msbuild.as_deref().or_else(|| resolver.msbuild()) {
                Some(path) => MsBuild::at(path)?,
                None => MsBuild::locate()?,
            };

            let wipe = wipe_outputs_enabled(
                wipe_outputs,
                resolver.wipe_outputs(),
                std::env::var_os(WIPE_OUTPUTS_ENV),
            );
            let request = resolve_build_request(
                &resolver,
                directory,
                sample_name,
                configuration,
                platform,
                log_dir,
            )?
            .verbose(cli.verbose)
            .wipe_outputs(wipe)
            .dry_run(cli.dry_run);

            let outcome = SampleBuilder::new(tool).build(&request)?;
            report_outcome(&outcome);
            if let Some(path) = summary {
                write_summary(&path, &request.directory, &outcome)?;
            }
            Ok(outcome.exit_code())
        }
        Command::Configs { directory } => {
            cmd_configs(&directory)?;
            Ok(0)
        }
        Command::Init { output } => {
            cmd_init(&output)?;
            Ok(0)
        }
    }
}

fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

/// Cleanup runs when the flag, the config file or the environment toggle asks for it.
fn wipe_outputs_enabled(flag: bool, configured: bool, env_value: Option<OsString>) -> bool {
    flag || configured || env_value.is_some()
}

fn resolve_build_request(
    resolver: &ConfigResolver,
    directory: PathBuf,
    sample_name: Option<String>,
    configuration: Option<String>,
    platform: Option<String>,
    log_dir: Option<PathBuf>,
) -> Result<BuildRequest> {
    let configuration = resolver.resolve(
        configuration,
        |c| c.build.configuration.clone(),
        slnbuild_sdk::DEFAULT_CONFIGURATION.to_string(),
    );
    let platform = resolver.resolve(
        platform,
        |c| c.build.platform.clone(),
        slnbuild_sdk::DEFAULT_PLATFORM.to_string(),
    );
    let log_dir = match log_dir.or_else(|| resolver.config.as_ref().and_then(|c| c.build.log_dir.clone())) {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    if configuration.trim().is_empty() || platform.trim().is_empty() {
        bail!("configuration and platform must not be empty");
    }

    let mut request = BuildRequest::new(directory)
        .configuration(configuration)
        .platform(platform)
        .log_dir(log_dir);
    if let Some(name) = sample_name {
        request = request.sample_name(name);
    }
    Ok(request)
}

fn report_outcome(outcome: &BuildOutcome) {
    match outcome {
        BuildOutcome::Succeeded { sample, logs } => {
            println!("✓ [{}] Build succeeded", sample);
            log::debug!("Output log: {}", logs.output.display());
        }
        BuildOutcome::Skipped {
            sample,
            requested,
            supported,
        } => {
            println!("⏩ [{}] Skipped: {} is not supported", sample, requested);
            if !supported.is_empty() {
                let list: Vec<String> = supported.iter().map(|p| p.to_string()).collect();
                log::debug!("Supported: {}", list.join(", "));
            }
        }
        BuildOutcome::Failed {
            sample, exit_code, ..
        } => {
            println!("✗ [{}] Build failed (exit code {})", sample, exit_code);
        }
    }
}

fn write_summary(path: &Path, directory: &Path, outcome: &BuildOutcome) -> Result<()> {
    let generated_at = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("formatting summary timestamp")?;
    let summary = BuildSummary {
        directory,
        generated_at,
        exit_code: outcome.exit_code(),
        outcome,
    };
    let json = serde_json::to_string_pretty(&summary)?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory {:?}", parent))?;
    }
    fs::write(path, json).with_context(|| format!("writing summary {:?}", path))?;
    log::debug!("Wrote build summary to {:?}", path);
    Ok(())
}

fn cmd_configs(directory: &Path) -> Result<()> {
    if !directory.is_dir() {
        bail!("directory does not exist: {}", directory.display());
    }
    let solution = solution::find_solution_file(directory)?
        .ok_or_else(|| slnbuild_sdk::BuildError::SolutionNotFound(directory.to_path_buf()))?;
    let pairs = solution::read_supported_pairs(&solution)
        .with_context(|| format!("reading solution {:?}", solution))?;

    if pairs.is_empty() {
        println!("{} declares no configuration/platform pairs.", solution.display());
    } else {
        for pair in pairs {
            println!("{}", pair);
        }
    }
    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    ensure_can_write(output)?;
    fs::write(output, SlnbuildConfig::generate_starter_toml())
        .with_context(|| format!("writing file {:?}", output))?;
    println!("✓ Wrote starter config to {:?}", output);
    Ok(())
}

fn ensure_can_write(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("refusing to overwrite existing file: {:?}", path);
    }
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory {:?}", parent))?;
    }
    Ok(())
}
