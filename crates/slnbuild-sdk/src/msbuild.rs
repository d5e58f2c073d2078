//! MSBuild invocation.
//!
//! Every sample is built with the same fixed argument template so that CI log
//! scraping sees identical output across samples:
//!
//! ```text
//! msbuild <solution> -clp:Verbosity=m -t:clean,build
//!     -property:Configuration=<Configuration> -property:Platform=<Platform>
//!     -p:TargetVersion=Windows10
//!     -p:InfVerif_AdditionalOptions="/msft /sw1205 /sw1324 /sw1420 /sw1421"
//!     -p:SignToolWS=/fdws -p:DriverCFlagAddOn=/wd4996 -warnaserror
//!     -flp1:errorsonly;logfile=<sample>.<cfg>.<plat>.err
//!     -flp2:WarningsOnly;logfile=<sample>.<cfg>.<plat>.wrn
//!     -noLogo > <sample>.<cfg>.<plat>.out
//! ```
//!
//! [`MsBuildInvocation`] is the typed form of that template and the only place
//! it is rendered to arguments. [`BuildTool`] is the seam the orchestrator
//! calls through; [`MsBuild`] is the real implementation.

use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::types::{BuildError, LogPaths};

/// Targets run on every build, in order.
pub const TARGETS: &[&str] = &["clean", "build"];

/// Console logger verbosity (`m` = minimal); full detail goes to the file loggers.
pub const CONSOLE_VERBOSITY: &str = "m";

/// Value of the `TargetVersion` property.
pub const TARGET_VERSION: &str = "Windows10";

/// InfVerif rules suppressed for all samples, passed as one option string.
pub const INFVERIF_OPTIONS: &[&str] = &["/msft", "/sw1205", "/sw1324", "/sw1420", "/sw1421"];

/// Value of the `SignToolWS` property.
pub const SIGNTOOL_WS: &str = "/fdws";

/// Extra compiler flags appended to driver builds.
pub const DRIVER_CFLAG_ADDON: &str = "/wd4996";

/// Default executable name looked up on `PATH`.
pub const MSBUILD_PROGRAM: &str = "msbuild";

/// One MSBuild run: a solution, a configuration/platform pair and three log sinks.
///
/// # Example
///
/// ```
/// use slnbuild_sdk::msbuild::MsBuildInvocation;
/// use slnbuild_sdk::LogPaths;
/// use std::path::Path;
///
/// let logs = LogPaths::new(Path::new("logs"), "general.echo", "Debug", "x64");
/// let invocation = MsBuildInvocation::new("general/echo/echo.sln", "Debug", "x64", logs);
/// let args = invocation.args();
/// assert_eq!(args[1], "-clp:Verbosity=m");
/// assert_eq!(args[2], "-t:clean,build");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsBuildInvocation {
    /// Solution file passed as the project argument.
    pub solution: PathBuf,
    /// Value of the `Configuration` property.
    pub configuration: String,
    /// Value of the `Platform` property.
    pub platform: String,
    /// Error, warning and console output destinations.
    pub logs: LogPaths,
}

impl MsBuildInvocation {
    pub fn new(
        solution: impl Into<PathBuf>,
        configuration: impl Into<String>,
        platform: impl Into<String>,
        logs: LogPaths,
    ) -> Self {
        Self {
            solution: solution.into(),
            configuration: configuration.into(),
            platform: platform.into(),
            logs,
        }
    }

    /// Properties passed with `-property:` / `-p:`, in command-line order.
    fn properties(&self) -> Vec<(&'static str, &'static str, String)> {
        vec![
            ("-property:", "Configuration", self.configuration.clone()),
            ("-property:", "Platform", self.platform.clone()),
            ("-p:", "TargetVersion", TARGET_VERSION.to_string()),
            ("-p:", "InfVerif_AdditionalOptions", INFVERIF_OPTIONS.join(" ")),
            ("-p:", "SignToolWS", SIGNTOOL_WS.to_string()),
            ("-p:", "DriverCFlagAddOn", DRIVER_CFLAG_ADDON.to_string()),
        ]
    }

    /// Renders the full argument list (everything after the program name).
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            self.solution.clone().into_os_string(),
            format!("-clp:Verbosity={}", CONSOLE_VERBOSITY).into(),
            format!("-t:{}", TARGETS.join(",")).into(),
        ];

        for (switch, name, value) in self.properties() {
            args.push(format!("{switch}{name}={value}").into());
        }

        args.push("-warnaserror".into());
        args.push(file_logger("-flp1:errorsonly;logfile=", &self.logs.errors));
        args.push(file_logger("-flp2:WarningsOnly;logfile=", &self.logs.warnings));
        args.push("-noLogo".into());
        args
    }

    /// A printable command line, quoting arguments that contain spaces.
    pub fn command_line(&self, program: &Path) -> String {
        std::iter::once(program.as_os_str().to_os_string())
            .chain(self.args())
            .map(|arg| quote(&arg))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn file_logger(prefix: &str, path: &Path) -> OsString {
    let mut arg = OsString::from(prefix);
    arg.push(path);
    arg
}

fn quote(arg: &OsStr) -> String {
    let text = arg.to_string_lossy();
    if text.contains(' ') {
        format!("\"{}\"", text)
    } else {
        text.into_owned()
    }
}

/// A build tool the orchestrator can run an invocation through.
pub trait BuildTool {
    /// Executable shown in logs and dry-run output.
    fn program(&self) -> &Path;

    /// Runs the invocation to completion and returns the tool's exit code.
    ///
    /// Only failing to start the tool is an error; a non-zero exit code is a
    /// normal return value.
    fn run(&self, invocation: &MsBuildInvocation) -> Result<i32, BuildError>;
}

/// MSBuild resolved to a concrete executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsBuild {
    program: PathBuf,
}

impl MsBuild {
    /// Resolves `msbuild` on `PATH`.
    pub fn locate() -> Result<Self, BuildError> {
        Self::at(MSBUILD_PROGRAM)
    }

    /// Resolves an explicit executable path or program name.
    pub fn at(program: impl AsRef<OsStr>) -> Result<Self, BuildError> {
        let program = program.as_ref();
        let resolved = which::which(program).map_err(|e| {
            BuildError::ToolNotFound(format!("{} ({})", program.to_string_lossy(), e))
        })?;
        log::debug!("Using build tool at {}", resolved.display());
        Ok(Self { program: resolved })
    }
}

impl BuildTool for MsBuild {
    fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, invocation: &MsBuildInvocation) -> Result<i32, BuildError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(invocation.args());

        // Console output goes to the .out log; fall back to the console when it can't be created.
        match File::create(&invocation.logs.output) {
            Ok(out) => {
                let err = out.try_clone()?;
                cmd.stdout(Stdio::from(out)).stderr(Stdio::from(err));
            }
            Err(e) => {
                log::warn!(
                    "Cannot create output log {}: {}. Build output will go to the console",
                    invocation.logs.output.display(),
                    e
                );
            }
        }

        log::debug!("Running {}", invocation.command_line(&self.program));
        let status = cmd.status().map_err(|e| {
            BuildError::ToolNotFound(format!(
                "failed to start {}: {}",
                self.program.display(),
                e
            ))
        })?;

        // Terminated by a signal: no exit code, treat as a generic failure.
        Ok(status.code().unwrap_or(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn invocation(log_dir: &Path) -> MsBuildInvocation {
        let logs = LogPaths::new(log_dir, "usb.kmdf_fx2", "Debug", "x64");
        MsBuildInvocation::new("usb/kmdf_fx2/kmdf_fx2.sln", "Debug", "x64", logs)
    }

    #[test]
    fn test_args_match_fixed_template() {
        let inv = invocation(Path::new("logs"));
        let args: Vec<String> = inv
            .args()
            .into_iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let errors = Path::new("logs").join("usb.kmdf_fx2.Debug.x64.err");
        let warnings = Path::new("logs").join("usb.kmdf_fx2.Debug.x64.wrn");
        let solution = PathBuf::from("usb/kmdf_fx2/kmdf_fx2.sln");
        let expected = vec![
            solution.to_string_lossy().into_owned(),
            "-clp:Verbosity=m".to_string(),
            "-t:clean,build".to_string(),
            "-property:Configuration=Debug".to_string(),
            "-property:Platform=x64".to_string(),
            "-p:TargetVersion=Windows10".to_string(),
            "-p:InfVerif_AdditionalOptions=/msft /sw1205 /sw1324 /sw1420 /sw1421".to_string(),
            "-p:SignToolWS=/fdws".to_string(),
            "-p:DriverCFlagAddOn=/wd4996".to_string(),
            "-warnaserror".to_string(),
            format!("-flp1:errorsonly;logfile={}", errors.display()),
            format!("-flp2:WarningsOnly;logfile={}", warnings.display()),
            "-noLogo".to_string(),
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn test_args_substitute_pair() {
        let logs = LogPaths::new(Path::new("."), "s", "Release", "ARM64");
        let inv = MsBuildInvocation::new("s.sln", "Release", "ARM64", logs);
        let args = inv.args();
        assert!(args.contains(&OsString::from("-property:Configuration=Release")));
        assert!(args.contains(&OsString::from("-property:Platform=ARM64")));
    }

    #[test]
    fn test_command_line_quotes_suppression_list() {
        let inv = invocation(Path::new("logs"));
        let line = inv.command_line(Path::new("msbuild"));
        assert!(line.starts_with("msbuild "));
        assert!(line.contains("\"-p:InfVerif_AdditionalOptions=/msft /sw1205 /sw1324 /sw1420 /sw1421\""));
        assert!(line.ends_with("-noLogo"));
    }

    #[test]
    fn test_locate_missing_tool() {
        let result = MsBuild::at("nonexistent-build-tool-12345");
        let err = result.unwrap_err();
        assert!(matches!(err, BuildError::ToolNotFound(_)));
        assert!(err.to_string().contains("nonexistent-build-tool-12345"));
    }

    /// Runs `sh <solution> <args...>` so the "solution" is a script that sees the MSBuild arguments.
    #[cfg(unix)]
    fn scripted_invocation(dir: &Path, exit_code: i32) -> MsBuildInvocation {
        let script = dir.join(format!("fake-build-{exit_code}.sh"));
        std::fs::write(
            &script,
            format!("echo \"args: $*\"\necho \"to stderr\" >&2\nexit {exit_code}\n"),
        )
        .unwrap();
        let logs = LogPaths::new(dir, "usb.kmdf_fx2", "Debug", "x64");
        MsBuildInvocation::new(script, "Debug", "x64", logs)
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_output_and_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let tool = MsBuild::at("sh").unwrap();

        let inv = scripted_invocation(temp_dir.path(), 0);
        assert_eq!(tool.run(&inv).unwrap(), 0);
        let out = std::fs::read_to_string(&inv.logs.output).unwrap();
        assert!(out.contains("-t:clean,build"));
        assert!(out.contains("-property:Platform=x64"));
        assert!(out.contains("to stderr"));

        let failing = scripted_invocation(temp_dir.path(), 3);
        assert_eq!(tool.run(&failing).unwrap(), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_rerun_overwrites_output_log() {
        let temp_dir = TempDir::new().unwrap();
        let tool = MsBuild::at("sh").unwrap();
        let inv = scripted_invocation(temp_dir.path(), 0);

        tool.run(&inv).unwrap();
        let first = std::fs::read_to_string(&inv.logs.output).unwrap();
        tool.run(&inv).unwrap();
        let second = std::fs::read_to_string(&inv.logs.output).unwrap();
        assert_eq!(first, second);
    }

    #[cfg(unix)]
    #[test]
    fn test_run_without_output_log_still_returns_exit_code() {
        let temp_dir = TempDir::new().unwrap();
        let tool = MsBuild::at("sh").unwrap();
        let mut inv = scripted_invocation(temp_dir.path(), 3);
        inv.logs.output = temp_dir.path().join("missing").join("usb.kmdf_fx2.Debug.x64.out");

        assert_eq!(tool.run(&inv).unwrap(), 3);
        assert!(!inv.logs.output.exists());
    }
}
