//! Driver sample build SDK
//!
//! `slnbuild-sdk` builds one Visual Studio solution for one
//! configuration/platform pair through MSBuild, the way the driver samples CI
//! does: it checks that the solution declares the pair, runs MSBuild with a
//! fixed argument template, writes three log files and reports a tri-state
//! outcome.
//!
//! # Architecture
//!
//! - **Solution**: Parses the `SolutionConfigurationPlatforms` section of a `.sln`
//! - **MSBuild**: Renders the fixed argument template and runs the build tool
//! - **Orchestrator**: Validates input, checks support, invokes, interprets the result
//! - **Cleanup**: Removes architecture output folders after successful builds
//!
//! # Exit codes
//!
//! | Outcome | Code |
//! |---------|------|
//! | [`BuildOutcome::Succeeded`] | 0 |
//! | [`BuildOutcome::Failed`] or any [`BuildError`] | 1 |
//! | [`BuildOutcome::Skipped`] | 2 |
//!
//! # Example
//!
//! ```ignore
//! use slnbuild_sdk::{BuildRequest, MsBuild, SampleBuilder};
//!
//! fn main() -> Result<(), slnbuild_sdk::BuildError> {
//!     let builder = SampleBuilder::new(MsBuild::locate()?);
//!     let request = BuildRequest::new("usb/kmdf_fx2")
//!         .configuration("Release")
//!         .platform("arm64")
//!         .log_dir("logs");
//!
//!     let outcome = builder.build(&request)?;
//!     println!("{}: exit code {}", outcome.sample(), outcome.exit_code());
//!     Ok(())
//! }
//! ```

pub mod cleanup;
pub mod msbuild;
pub mod orchestrator;
pub mod solution;
pub mod types;

pub use msbuild::{BuildTool, MsBuild, MsBuildInvocation};
pub use orchestrator::{SampleBuilder, derive_sample_name};
pub use types::{
    BuildError, BuildOutcome, BuildRequest, ConfigPlatform, DEFAULT_CONFIGURATION,
    DEFAULT_PLATFORM, LogPaths,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
