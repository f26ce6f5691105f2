//! Default save and log locations.
//!
//! Used when no `--save-dir` is given. Follows OS conventions (XDG on Linux,
//! Known Folders on Windows, Library on macOS).

use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("could not determine OS data directory")]
    NoDataDir,
    #[error("platform I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Where a world's settings and logs live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlatformDirs {
    /// Holds `cubicgen.ron` and `world.ron`.
    pub save_dir: PathBuf,
    pub log_dir: PathBuf,
}

const APP_NAME: &str = "cubicgen";

impl PlatformDirs {
    /// Resolve the default world folder without creating it.
    pub fn resolve() -> Result<Self, PlatformError> {
        let data = dirs::data_dir().ok_or(PlatformError::NoDataDir)?;
        Ok(Self::resolve_with_root(&data))
    }

    /// Directories rooted under `root`, for an explicit `--save-dir` and tests.
    pub fn resolve_with_root(root: &Path) -> Self {
        let app_dir = root.join(APP_NAME);
        Self {
            save_dir: app_dir.join("world"),
            log_dir: app_dir.join("logs"),
        }
    }

    /// Uses `save_dir` as the world folder with logs beside its contents.
    pub fn for_save_dir(save_dir: &Path) -> Self {
        Self {
            save_dir: save_dir.to_path_buf(),
            log_dir: save_dir.join("logs"),
        }
    }

    pub fn create_dirs(&self) -> Result<(), PlatformError> {
        std::fs::create_dir_all(&self.save_dir)?;
        std::fs::create_dir_all(&self.log_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_is_absolute() {
        let dirs = PlatformDirs::resolve().expect("data directory available on test hosts");
        assert!(dirs.save_dir.is_absolute(), "save_dir is not absolute");
        assert!(dirs.save_dir.ends_with("cubicgen/world"));
    }

    #[test]
    fn test_directory_creation() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = PlatformDirs::resolve_with_root(tmp.path());
        dirs.create_dirs().unwrap();
        assert!(dirs.save_dir.exists(), "save_dir was not created");
        assert!(dirs.log_dir.exists(), "log_dir was not created");
    }

    #[test]
    fn test_explicit_save_dir() {
        let dirs = PlatformDirs::for_save_dir(Path::new("saves").join("alpha").as_path());
        assert_eq!(dirs.save_dir, Path::new("saves").join("alpha"));
        assert_eq!(dirs.log_dir, Path::new("saves").join("alpha").join("logs"));
    }
}
