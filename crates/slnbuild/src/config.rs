//! Configuration file support for slnbuild.
//!
//! A `slnbuild.toml` file lets a checkout pin its build defaults instead of
//! repeating CLI flags in every CI step.
//!
//! ## Configuration File Location
//!
//! The configuration file is searched for in the following order:
//! 1. The path given with `--config`
//! 2. Current working directory (`./slnbuild.toml`)
//! 3. Parent directories (up to the repository root or filesystem root)
//!
//! ## Example Configuration
//!
//! ```toml
//! [build]
//! configuration = "Release"
//! platform = "arm64"
//! log_dir = "logs"
//! msbuild = "C:/Program Files/Microsoft Visual Studio/2022/Enterprise/MSBuild/Current/Bin/MSBuild.exe"
//!
//! [cleanup]
//! wipe_outputs = true
//! ```
//!
//! The MSBuild argument template itself is fixed and cannot be configured.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The default configuration file name.
pub const CONFIG_FILE_NAME: &str = "slnbuild.toml";

/// Root configuration structure for `slnbuild.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlnbuildConfig {
    /// Build defaults.
    pub build: BuildSection,

    /// Post-build cleanup.
    pub cleanup: CleanupSection,
}

/// Build defaults. Every field can be overridden on the command line.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Default configuration (falls back to `Debug`).
    pub configuration: Option<String>,

    /// Default platform (falls back to `x64`).
    pub platform: Option<String>,

    /// Directory for `.err`, `.wrn` and `.out` logs (falls back to the current directory).
    pub log_dir: Option<PathBuf>,

    /// Explicit MSBuild executable. When unset, `msbuild` is looked up on `PATH`.
    pub msbuild: Option<PathBuf>,
}

/// Post-build cleanup settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupSection {
    /// Remove `x64`/`arm64` output folders after a successful build.
    pub wipe_outputs: bool,
}

impl SlnbuildConfig {
    /// Loads configuration from the specified file path.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: SlnbuildConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Attempts to find and load configuration from the current directory
    /// or any parent directory.
    pub fn discover() -> Result<Option<(Self, PathBuf)>> {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        Self::discover_from(&cwd)
    }

    /// Attempts to find and load configuration starting from the specified directory.
    ///
    /// # Returns
    ///
    /// * `Ok(Some((config, path)))` - Found and loaded configuration with its path
    /// * `Ok(None)` - No configuration file found
    /// * `Err` - If a config file was found but couldn't be parsed
    pub fn discover_from(start_dir: &Path) -> Result<Option<(Self, PathBuf)>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);

            if config_path.is_file() {
                let config = Self::load_from_file(&config_path)?;
                return Ok(Some((config, config_path)));
            }

            // Stop at repository root or filesystem root
            if current.join(".git").exists() || !current.pop() {
                break;
            }
        }

        Ok(None)
    }

    /// Generates a starter configuration file as a formatted TOML string.
    pub fn generate_starter_toml() -> String {
        format!(
            r#"# slnbuild configuration file
# CLI flags override these settings when provided.

[build]
# Configuration to build (default: {configuration})
# configuration = "Release"

# Platform to build (default: {platform})
# platform = "arm64"

# Directory receiving <sample>.<configuration>.<platform>.{{err,wrn,out}} (default: current directory)
# log_dir = "logs"

# MSBuild executable (default: msbuild found on PATH)
# msbuild = "C:/Program Files/Microsoft Visual Studio/2022/Enterprise/MSBuild/Current/Bin/MSBuild.exe"

[cleanup]
# Remove x64/arm64 output folders after a successful build.
# Setting the WDS_WipeOutputs environment variable also enables this.
wipe_outputs = false
"#,
            configuration = slnbuild_sdk::DEFAULT_CONFIGURATION,
            platform = slnbuild_sdk::DEFAULT_PLATFORM,
        )
    }
}

/// Configuration resolver that merges config file values with CLI arguments.
///
/// CLI arguments always take precedence over config file values.
#[derive(Debug, Default)]
pub struct ConfigResolver {
    /// Loaded configuration, if any.
    pub config: Option<SlnbuildConfig>,

    /// Path to the loaded config file, if any.
    pub config_path: Option<PathBuf>,
}

impl ConfigResolver {
    /// Loads the explicit config file, or discovers one from the current directory.
    pub fn new(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Ok(Self {
                config: Some(SlnbuildConfig::load_from_file(path)?),
                config_path: Some(path.to_path_buf()),
            });
        }

        match SlnbuildConfig::discover()? {
            Some((config, path)) => Ok(Self {
                config: Some(config),
                config_path: Some(path),
            }),
            None => Ok(Self::default()),
        }
    }

    /// Resolves a CLI value, using config as fallback.
    ///
    /// # Returns
    ///
    /// The resolved value, preferring CLI over config over default.
    pub fn resolve<T, F>(&self, cli_value: Option<T>, config_getter: F, default: T) -> T
    where
        F: FnOnce(&SlnbuildConfig) -> Option<T>,
    {
        cli_value
            .or_else(|| self.config.as_ref().and_then(config_getter))
            .unwrap_or(default)
    }

    /// Returns the configured MSBuild executable, if any.
    pub fn msbuild(&self) -> Option<&Path> {
        self.config
            .as_ref()
            .and_then(|c| c.build.msbuild.as_deref())
    }

    /// Whether the config file enables output cleanup.
    pub fn wipe_outputs(&self) -> bool {
        self.config
            .as_ref()
            .map(|c| c.cleanup.wipe_outputs)
            .unwrap_or(false)
    }
}
