//! Core types for slnbuild-sdk.
//!
//! This module defines the fundamental types used throughout the SDK:
//!
//! - [`BuildError`] - Hard failures that stop a build before or while invoking MSBuild
//! - [`ConfigPlatform`] - A `Configuration|Platform` pair declared by a solution
//! - [`BuildRequest`] - Everything needed to build one sample for one pair
//! - [`LogPaths`] - The three log files written per build
//! - [`BuildOutcome`] - Tri-state result of a build (succeeded, skipped, failed)

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration used when none is requested.
pub const DEFAULT_CONFIGURATION: &str = "Debug";

/// Platform used when none is requested.
pub const DEFAULT_PLATFORM: &str = "x64";

/// Error types for slnbuild-sdk operations.
///
/// Every variant is a hard failure and maps to process exit code 1. Expected
/// non-error outcomes (an unsupported configuration, a failing build) are
/// reported through [`BuildOutcome`] instead.
///
/// # Example
///
/// ```ignore
/// use slnbuild_sdk::{BuildError, BuildRequest, SampleBuilder};
///
/// match builder.build(&request) {
///     Ok(outcome) => std::process::exit(outcome.exit_code()),
///     Err(BuildError::SolutionNotFound(dir)) => {
///         eprintln!("nothing to build in {}", dir.display());
///     }
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The build tool could not be located or started.
    #[error(
        "build tool not found: {0}\n\n\
         Ensure MSBuild is on PATH (run from a Developer Command Prompt or EWDK environment) \
         or pass --msbuild <PATH>."
    )]
    ToolNotFound(String),

    /// The sample directory does not exist or is not a directory.
    #[error("directory does not exist: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    /// No `*.sln` file was found directly inside the sample directory.
    #[error(
        "no solution file found in {}\n\n\
         Expected a *.sln file directly inside the sample directory (subdirectories are not searched).",
        .0.display()
    )]
    SolutionNotFound(PathBuf),

    /// An I/O error occurred.
    ///
    /// Common causes include an unreadable solution file or log files that
    /// cannot be created.
    #[error("I/O error: {0}. Check file paths and permissions")]
    Io(#[from] std::io::Error),
}

/// A `(configuration, platform)` pair declared in a solution file.
///
/// Both fields are stored trimmed. Comparison is exact and case-sensitive, so
/// `Debug|x64` and `debug|x64` are different pairs.
///
/// # Example
///
/// ```
/// use slnbuild_sdk::ConfigPlatform;
///
/// let pair = ConfigPlatform::new(" Debug ", "x64");
/// assert_eq!(pair.configuration(), "Debug");
/// assert_eq!(pair.to_string(), "Debug|x64");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConfigPlatform {
    configuration: String,
    platform: String,
}

impl ConfigPlatform {
    /// Creates a pair, trimming surrounding whitespace from both fields.
    pub fn new(configuration: impl AsRef<str>, platform: impl AsRef<str>) -> Self {
        Self {
            configuration: configuration.as_ref().trim().to_string(),
            platform: platform.as_ref().trim().to_string(),
        }
    }

    pub fn configuration(&self) -> &str {
        &self.configuration
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }
}

impl fmt::Display for ConfigPlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}|{}", self.configuration, self.platform)
    }
}

/// Request to build one sample directory for one configuration/platform pair.
///
/// Constructed once from CLI and config input; the orchestrator never mutates it.
///
/// # Example
///
/// ```
/// use slnbuild_sdk::BuildRequest;
///
/// let request = BuildRequest::new("usb/kmdf_fx2")
///     .configuration("Release")
///     .platform("arm64")
///     .log_dir("logs");
///
/// assert_eq!(request.pair().to_string(), "Release|arm64");
/// assert!(!request.wipe_outputs);
/// ```
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Directory containing the sample's solution file.
    pub directory: PathBuf,
    /// Name used for log files. Derived from `directory` when `None` or blank.
    pub sample_name: Option<String>,
    /// Build configuration, e.g. `Debug` or `Release`.
    pub configuration: String,
    /// Target platform, e.g. `x64` or `arm64`.
    pub platform: String,
    /// Directory receiving the `.err`, `.wrn` and `.out` logs.
    pub log_dir: PathBuf,
    /// Surface the error log location when the build fails.
    pub verbose: bool,
    /// Delete architecture-named output folders after a successful build.
    pub wipe_outputs: bool,
    /// Print the MSBuild command line instead of running it.
    pub dry_run: bool,
}

impl BuildRequest {
    /// Creates a request with default configuration (`Debug`), platform (`x64`)
    /// and the current directory as log directory.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            sample_name: None,
            configuration: DEFAULT_CONFIGURATION.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            log_dir: PathBuf::from("."),
            verbose: false,
            wipe_outputs: false,
            dry_run: false,
        }
    }

    pub fn sample_name(mut self, name: impl Into<String>) -> Self {
        self.sample_name = Some(name.into());
        self
    }

    pub fn configuration(mut self, configuration: impl Into<String>) -> Self {
        self.configuration = configuration.into();
        self
    }

    pub fn platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    pub fn log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn wipe_outputs(mut self, wipe_outputs: bool) -> Self {
        self.wipe_outputs = wipe_outputs;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// The requested pair, trimmed the same way parsed pairs are.
    pub fn pair(&self) -> ConfigPlatform {
        ConfigPlatform::new(&self.configuration, &self.platform)
    }
}

/// Paths of the three log files produced by one build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogPaths {
    /// Errors only (`.err`).
    pub errors: PathBuf,
    /// Warnings only (`.wrn`).
    pub warnings: PathBuf,
    /// Combined console output (`.out`).
    pub output: PathBuf,
}

impl LogPaths {
    /// Builds `<log_dir>/<sample>.<configuration>.<platform>.{err,wrn,out}`.
    ///
    /// # Example
    ///
    /// ```
    /// use slnbuild_sdk::LogPaths;
    /// use std::path::Path;
    ///
    /// let logs = LogPaths::new(Path::new("logs"), "usb.kmdf_fx2", "Debug", "x64");
    /// assert_eq!(logs.errors, Path::new("logs/usb.kmdf_fx2.Debug.x64.err"));
    /// ```
    pub fn new(log_dir: &Path, sample: &str, configuration: &str, platform: &str) -> Self {
        let stem = format!("{}.{}.{}", sample, configuration, platform);
        Self {
            errors: log_dir.join(format!("{stem}.err")),
            warnings: log_dir.join(format!("{stem}.wrn")),
            output: log_dir.join(format!("{stem}.out")),
        }
    }
}

/// Result of an orchestrated build.
///
/// Callers aggregating many samples must keep [`BuildOutcome::Skipped`]
/// separate from [`BuildOutcome::Failed`]: a skip is expected for samples that
/// do not target every platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BuildOutcome {
    /// The build tool exited with code 0 (or the build was a dry run).
    Succeeded { sample: String, logs: LogPaths },
    /// The solution does not declare the requested pair; nothing was built.
    Skipped {
        sample: String,
        requested: ConfigPlatform,
        supported: BTreeSet<ConfigPlatform>,
    },
    /// The build tool exited with a non-zero code.
    Failed {
        sample: String,
        exit_code: i32,
        logs: LogPaths,
    },
}

impl BuildOutcome {
    /// Process exit code for this outcome: 0 succeeded, 1 failed, 2 skipped.
    pub fn exit_code(&self) -> u8 {
        match self {
            BuildOutcome::Succeeded { .. } => 0,
            BuildOutcome::Failed { .. } => 1,
            BuildOutcome::Skipped { .. } => 2,
        }
    }

    pub fn sample(&self) -> &str {
        match self {
            BuildOutcome::Succeeded { sample, .. }
            | BuildOutcome::Skipped { sample, .. }
            | BuildOutcome::Failed { sample, .. } => sample,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Succeeded { .. })
    }
}
