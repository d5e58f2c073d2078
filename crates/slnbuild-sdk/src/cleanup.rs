//! Post-build removal of architecture-specific output folders.
//!
//! Building every sample of a large tree fills the disk with intermediate
//! `x64/` and `arm64/` folders. When enabled, the orchestrator removes them
//! after a successful build. Failed builds keep their outputs for diagnosis.

use std::fs;
use std::path::{Path, PathBuf};

use crate::types::BuildError;

/// Output folder names MSBuild creates per target architecture.
pub const ARCH_OUTPUT_DIRS: &[&str] = &["x64", "arm64"];

/// Recursively deletes every directory under `root` named after a target
/// architecture (case-insensitive). Symlinks are never followed.
///
/// Returns the removed directories.
pub fn wipe_outputs(root: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut removed = Vec::new();
    wipe_dir(root, &mut removed)?;
    Ok(removed)
}

fn wipe_dir(dir: &Path, removed: &mut Vec<PathBuf>) -> Result<(), BuildError> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }

        let path = entry.path();
        if is_arch_output(&entry.file_name().to_string_lossy()) {
            fs::remove_dir_all(&path)?;
            log::debug!("Removed {}", path.display());
            removed.push(path);
        } else {
            wipe_dir(&path, removed)?;
        }
    }
    Ok(())
}

fn is_arch_output(name: &str) -> bool {
    ARCH_OUTPUT_DIRS
        .iter()
        .any(|arch| arch.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_removes_arch_dirs_at_any_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("x64/Debug")).unwrap();
        fs::create_dir_all(root.join("driver/ARM64/Release")).unwrap();
        fs::create_dir_all(root.join("exe/src")).unwrap();
        fs::write(root.join("driver/driver.vcxproj"), "").unwrap();
        fs::write(root.join("x64/Debug/driver.sys"), "").unwrap();

        let mut removed = wipe_outputs(root).unwrap();
        removed.sort();

        assert_eq!(removed, vec![root.join("driver/ARM64"), root.join("x64")]);
        assert!(!root.join("x64").exists());
        assert!(!root.join("driver/ARM64").exists());
        assert!(root.join("driver/driver.vcxproj").exists());
        assert!(root.join("exe/src").exists());
    }

    #[test]
    fn test_files_named_like_arch_are_kept() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("x64"), "not a directory").unwrap();

        let removed = wipe_outputs(temp_dir.path()).unwrap();
        assert!(removed.is_empty());
        assert!(temp_dir.path().join("x64").is_file());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let result = wipe_outputs(Path::new("/nonexistent/sample/dir"));
        assert!(matches!(result, Err(BuildError::Io(_))));
    }
}
