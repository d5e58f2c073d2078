//! Build orchestration for a single sample.
//!
//! [`SampleBuilder`] runs one linear pipeline per request:
//!
//! 1. **Validate directory** - the sample directory must exist
//! 2. **Ensure log directory** - created if missing; failure only degrades logging
//! 3. **Resolve sample name** - explicit, or derived from the directory path
//! 4. **Locate solution** - first `*.sln` directly inside the directory
//! 5. **Check support** - the solution must declare the requested pair, otherwise the
//!    build is skipped
//! 6. **Invoke** - run the build tool with the fixed MSBuild template
//! 7. **Interpret exit code** - zero succeeds, anything else fails
//! 8. **Cleanup** - optionally remove architecture output folders after success
//!
//! Locating the build tool happens before a `SampleBuilder` can exist, so a
//! missing tool stops the run before any of these steps.

use std::path::{Path, PathBuf};

use crate::cleanup;
use crate::msbuild::{BuildTool, MsBuildInvocation};
use crate::solution;
use crate::types::{BuildError, BuildOutcome, BuildRequest, LogPaths};

/// Builds sample directories through a [`BuildTool`].
///
/// # Example
///
/// ```ignore
/// use slnbuild_sdk::{BuildRequest, MsBuild, SampleBuilder};
///
/// let builder = SampleBuilder::new(MsBuild::locate()?);
/// let request = BuildRequest::new("usb/kmdf_fx2").platform("arm64");
/// let outcome = builder.build(&request)?;
/// std::process::exit(outcome.exit_code().into());
/// # Ok::<(), slnbuild_sdk::BuildError>(())
/// ```
pub struct SampleBuilder<T> {
    tool: T,
    /// Base for sample-name derivation; the process working directory when `None`.
    working_dir: Option<PathBuf>,
}

impl<T: BuildTool> SampleBuilder<T> {
    pub fn new(tool: T) -> Self {
        Self {
            tool,
            working_dir: None,
        }
    }

    /// Overrides the directory sample names are derived relative to.
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn tool(&self) -> &T {
        &self.tool
    }

    /// Runs the full pipeline for one request.
    ///
    /// # Returns
    ///
    /// * `Ok(BuildOutcome)` - succeeded, skipped (unsupported pair) or failed (non-zero exit)
    /// * `Err(BuildError)` - the directory or solution is missing, or the tool could not run
    pub fn build(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
        let directory = &request.directory;
        if !directory.is_dir() {
            return Err(BuildError::DirectoryNotFound(directory.clone()));
        }

        if !request.dry_run
            && let Err(e) = std::fs::create_dir_all(&request.log_dir)
        {
            log::warn!(
                "Could not create log directory {}: {}. Continuing without guaranteed log capture",
                request.log_dir.display(),
                e
            );
        }

        let sample = self.resolve_sample_name(request)?;
        log::debug!("[{}] Building {}", sample, directory.display());

        let solution = solution::find_solution_file(directory)?
            .ok_or_else(|| BuildError::SolutionNotFound(directory.clone()))?;
        log::debug!("[{}] Using solution {}", sample, solution.display());

        let requested = request.pair();
        let supported = solution::read_supported_pairs(&solution)?;
        if !supported.contains(&requested) {
            log::info!(
                "[{}] Skipped. Configuration {} not supported",
                sample,
                requested
            );
            return Ok(BuildOutcome::Skipped {
                sample,
                requested,
                supported,
            });
        }

        let logs = LogPaths::new(
            &request.log_dir,
            &sample,
            requested.configuration(),
            requested.platform(),
        );
        let invocation = MsBuildInvocation::new(
            solution,
            requested.configuration(),
            requested.platform(),
            logs.clone(),
        );

        if request.dry_run {
            println!(
                "[dry-run] Would run: {}",
                invocation.command_line(self.tool.program())
            );
            return Ok(BuildOutcome::Succeeded { sample, logs });
        }

        log::info!("[{}] Building {}", sample, requested);
        let exit_code = self.tool.run(&invocation)?;
        if exit_code != 0 {
            if let Some(message) = failure_warning(&sample, exit_code, &logs, request.verbose) {
                log::warn!("{}", message);
            }
            return Ok(BuildOutcome::Failed {
                sample,
                exit_code,
                logs,
            });
        }

        if request.wipe_outputs {
            match cleanup::wipe_outputs(directory) {
                Ok(removed) => log::debug!(
                    "[{}] Wiped {} output folder(s) under {}",
                    sample,
                    removed.len(),
                    directory.display()
                ),
                Err(e) => log::warn!(
                    "[{}] Could not wipe outputs under {}: {}",
                    sample,
                    directory.display(),
                    e
                ),
            }
        }

        log::info!("[{}] Build succeeded", sample);
        Ok(BuildOutcome::Succeeded { sample, logs })
    }

    fn resolve_sample_name(&self, request: &BuildRequest) -> Result<String, BuildError> {
        if let Some(name) = request.sample_name.as_deref()
            && !name.trim().is_empty()
        {
            return Ok(name.to_string());
        }
        let cwd = match &self.working_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };
        Ok(derive_sample_name(&request.directory, &cwd))
    }
}

/// Warning for a failed build, pointing at the error log. Only shown when verbose.
fn failure_warning(sample: &str, exit_code: i32, logs: &LogPaths, verbose: bool) -> Option<String> {
    verbose.then(|| {
        format!(
            "[{}] Build failed (exit code {}). Log available at {}",
            sample,
            exit_code,
            logs.errors.display()
        )
    })
}

/// Derives a sample name from its directory.
///
/// The path is taken relative to `cwd` (absolute paths outside `cwd` are used
/// as-is), separators become `.`, the result is lower-cased and leading or
/// trailing dots are trimmed. When nothing is left (the directory is `cwd`
/// itself), the lower-cased last component of the canonical path is used.
///
/// # Example
///
/// ```
/// use slnbuild_sdk::orchestrator::derive_sample_name;
/// use std::path::Path;
///
/// assert_eq!(derive_sample_name(Path::new(r".\usb\kmdf_fx2"), Path::new("C:/src")), "usb.kmdf_fx2");
/// assert_eq!(derive_sample_name(Path::new("./general/Echo/"), Path::new("/src")), "general.echo");
/// ```
pub fn derive_sample_name(directory: &Path, cwd: &Path) -> String {
    let relative = directory.strip_prefix(cwd).unwrap_or(directory);
    let name = relative
        .to_string_lossy()
        .replace(['/', '\\'], ".")
        .to_lowercase()
        .trim_matches('.')
        .to_string();
    if !name.is_empty() {
        return name;
    }

    directory
        .canonicalize()
        .ok()
        .and_then(|path| path.file_name().map(|n| n.to_string_lossy().to_lowercase()))
        .unwrap_or(name)
}
