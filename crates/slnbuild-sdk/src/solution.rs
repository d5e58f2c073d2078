//! Solution file inspection.
//!
//! A Visual Studio solution declares the configuration/platform pairs it can
//! build inside a dedicated global section:
//!
//! ```text
//! Global
//!     GlobalSection(SolutionConfigurationPlatforms) = preSolution
//!         Debug|x64 = Debug|x64
//!         Release|ARM64 = Release|ARM64
//!     EndGlobalSection
//! EndGlobal
//! ```
//!
//! [`parse_supported_pairs`] scans that section line by line with a two-state
//! scanner. It never fails: malformed entries are logged and skipped, and a
//! solution without the section simply supports nothing.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::types::{BuildError, ConfigPlatform};

const SECTION_HEADER: &str = "GlobalSection(SolutionConfigurationPlatforms)";
const SECTION_END: &str = "EndGlobalSection";

/// Returns the first `*.sln` file directly inside `dir`.
///
/// Entries are sorted by file name so the choice is stable across platforms.
/// The extension match is case-insensitive; subdirectories are not searched.
pub fn find_solution_file(dir: &Path) -> Result<Option<PathBuf>, BuildError> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_sln = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("sln"));
        if is_sln && path.is_file() {
            candidates.push(path);
        }
    }
    candidates.sort();
    Ok(candidates.into_iter().next())
}

/// Reads a solution file and returns the pairs it declares.
pub fn read_supported_pairs(solution: &Path) -> Result<BTreeSet<ConfigPlatform>, BuildError> {
    let contents = fs::read_to_string(solution)?;
    Ok(parse_with_source(&contents, Some(solution)))
}

/// Parses the `SolutionConfigurationPlatforms` section(s) of solution text.
///
/// Repeated sections are unioned and duplicate pairs collapse.
///
/// # Example
///
/// ```
/// use slnbuild_sdk::solution::parse_supported_pairs;
/// use slnbuild_sdk::ConfigPlatform;
///
/// let text = "\
/// \tGlobalSection(SolutionConfigurationPlatforms) = preSolution
/// \t\tDebug|x64 = Debug|x64
/// \tEndGlobalSection
/// ";
/// let pairs = parse_supported_pairs(text);
/// assert!(pairs.contains(&ConfigPlatform::new("Debug", "x64")));
/// ```
pub fn parse_supported_pairs(contents: &str) -> BTreeSet<ConfigPlatform> {
    parse_with_source(contents, None)
}

fn parse_with_source(contents: &str, source: Option<&Path>) -> BTreeSet<ConfigPlatform> {
    let mut pairs = BTreeSet::new();
    let mut in_section = false;

    for line in contents.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with(SECTION_HEADER) {
            in_section = true;
            continue;
        }
        if trimmed.starts_with(SECTION_END) {
            in_section = false;
            continue;
        }
        if !in_section || trimmed.trim_end().is_empty() {
            continue;
        }

        match parse_entry(line) {
            Some(pair) => {
                pairs.insert(pair);
            }
            None => match source {
                Some(path) => log::warn!(
                    "Could not parse configuration entry '{}' from {}",
                    line.trim(),
                    path.display()
                ),
                None => log::warn!("Could not parse configuration entry '{}'", line.trim()),
            },
        }
    }

    pairs
}

/// Matches `<anything> = <Configuration>|<Platform>`.
///
/// The right-hand side starts after the last `=` and is split at its last `|`.
fn parse_entry(line: &str) -> Option<ConfigPlatform> {
    let (_, value) = line.rsplit_once('=')?;
    let (configuration, platform) = value.rsplit_once('|')?;
    let pair = ConfigPlatform::new(configuration, platform);
    if pair.configuration().is_empty() || pair.platform().is_empty() {
        return None;
    }
    Some(pair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const DRIVER_SOLUTION: &str = r#"
Microsoft Visual Studio Solution File, Format Version 12.00
# Visual Studio Version 17
VisualStudioVersion = 17.0.31903.59
Project("{8BC9CEB8-8B4A-11D0-8D11-00A0C91BC942}") = "kmdf_fx2", "driver\kmdf_fx2.vcxproj", "{1B29B0A5-9F57-4C1A-8D4F-2B3A0C1C3F0E}"
EndProject
Global
	GlobalSection(SolutionConfigurationPlatforms) = preSolution
		Debug|ARM64 = Debug|ARM64
		Debug|x64 = Debug|x64
		Release|ARM64 = Release|ARM64
		Release|x64 = Release|x64
	EndGlobalSection
	GlobalSection(ProjectConfigurationPlatforms) = postSolution
		{1B29B0A5-9F57-4C1A-8D4F-2B3A0C1C3F0E}.Debug|ARM64.ActiveCfg = Debug|ARM64
		{1B29B0A5-9F57-4C1A-8D4F-2B3A0C1C3F0E}.Debug|x64.Build.0 = Debug|x64
	EndGlobalSection
	GlobalSection(SolutionProperties) = preSolution
		HideSolutionNode = FALSE
	EndGlobalSection
EndGlobal
"#;

    fn pair(configuration: &str, platform: &str) -> ConfigPlatform {
        ConfigPlatform::new(configuration, platform)
    }

    #[test]
    fn test_parses_only_solution_configuration_section() {
        let pairs = parse_supported_pairs(DRIVER_SOLUTION);
        let expected: BTreeSet<_> = [
            pair("Debug", "ARM64"),
            pair("Debug", "x64"),
            pair("Release", "ARM64"),
            pair("Release", "x64"),
        ]
        .into_iter()
        .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_no_section_yields_empty_set() {
        let text = "Global\n\tGlobalSection(SolutionProperties) = preSolution\n\t\tHideSolutionNode = FALSE\n\tEndGlobalSection\nEndGlobal\n";
        assert!(parse_supported_pairs(text).is_empty());
        assert!(parse_supported_pairs("").is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped_without_aborting() {
        let text = "\
GlobalSection(SolutionConfigurationPlatforms) = preSolution
    Debug|x64 = Debug|x64
    Broken = NoPipeHere
    NoEqualsSign Debug|ARM64
    Release|x64 = Release|
    Release|x64 = |x64
    Release|ARM64 = Release|ARM64
EndGlobalSection
";
        let pairs = parse_supported_pairs(text);
        let expected: BTreeSet<_> = [pair("Debug", "x64"), pair("Release", "ARM64")]
            .into_iter()
            .collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn test_repeated_sections_are_unioned() {
        let text = "\
GlobalSection(SolutionConfigurationPlatforms) = preSolution
    Debug|x64 = Debug|x64
EndGlobalSection
GlobalSection(ProjectConfigurationPlatforms) = postSolution
    {GUID}.Debug|Win32.ActiveCfg = Debug|Win32
EndGlobalSection
GlobalSection(SolutionConfigurationPlatforms) = preSolution
    Release|ARM64 = Release|ARM64
    Debug|x64 = Debug|x64
EndGlobalSection
";
        let pairs = parse_supported_pairs(text);
        assert_eq!(pairs.len(), 2);
        assert!(pairs.contains(&pair("Debug", "x64")));
        assert!(pairs.contains(&pair("Release", "ARM64")));
        assert!(!pairs.contains(&pair("Debug", "Win32")));
    }

    #[test]
    fn test_entries_outside_section_are_ignored() {
        let text = "\
    Debug|x64 = Debug|x64
GlobalSection(SolutionConfigurationPlatforms) = preSolution
EndGlobalSection
    Release|x64 = Release|x64
";
        assert!(parse_supported_pairs(text).is_empty());
    }

    #[test]
    fn test_splits_on_last_pipe_and_trims() {
        let parsed = parse_entry("\t\tWeird|Name = Debug|Special|x64   ").expect("entry");
        assert_eq!(parsed, pair("Debug|Special", "x64"));
        let parsed = parse_entry("Debug|x64=Debug |  x64").expect("entry");
        assert_eq!(parsed, pair("Debug", "x64"));
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "GlobalSection(SolutionConfigurationPlatforms) = preSolution\r\n\t\tDebug|x64 = Debug|x64\r\nEndGlobalSection\r\n";
        let pairs = parse_supported_pairs(text);
        assert_eq!(pairs.into_iter().collect::<Vec<_>>(), vec![pair("Debug", "x64")]);
    }

    #[test]
    fn test_find_solution_file() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(find_solution_file(temp_dir.path()).unwrap(), None);

        std::fs::write(temp_dir.path().join("README.md"), "readme").unwrap();
        std::fs::create_dir(temp_dir.path().join("nested")).unwrap();
        std::fs::write(temp_dir.path().join("nested").join("inner.sln"), "").unwrap();
        assert_eq!(find_solution_file(temp_dir.path()).unwrap(), None);

        std::fs::write(temp_dir.path().join("zeta.sln"), "").unwrap();
        std::fs::write(temp_dir.path().join("Alpha.SLN"), "").unwrap();
        let found = find_solution_file(temp_dir.path()).unwrap().unwrap();
        assert_eq!(found, temp_dir.path().join("Alpha.SLN"));
    }

    #[cfg(unix)]
    #[test]
    fn test_find_solution_file_follows_symlinks() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("shared").join("kmdf_fx2.sln");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "").unwrap();
        let sample_dir = temp_dir.path().join("kmdf_fx2");
        fs::create_dir_all(&sample_dir).unwrap();
        std::os::unix::fs::symlink(&target, sample_dir.join("linked.sln")).unwrap();

        let found = find_solution_file(&sample_dir).unwrap();
        assert_eq!(found, Some(sample_dir.join("linked.sln")));
    }

    #[test]
    fn test_read_supported_pairs_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let sln = temp_dir.path().join("kmdf_fx2.sln");
        std::fs::write(&sln, DRIVER_SOLUTION).unwrap();

        let pairs = read_supported_pairs(&sln).unwrap();
        assert_eq!(pairs.len(), 4);

        let missing = read_supported_pairs(&temp_dir.path().join("missing.sln"));
        assert!(matches!(missing, Err(BuildError::Io(_))));
    }
}
