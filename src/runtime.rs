use anyhow::{Context, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// System operations used by commands and file-backed sources.
#[cfg_attr(test, mockall::automock)]
pub trait Runtime: Send + Sync {
    // Environment
    fn env_var(&self, key: &str) -> Result<String, env::VarError>;

    // File System
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;

    // Directories
    fn config_dir(&self) -> Option<PathBuf>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RealRuntime;

impl Runtime for RealRuntime {
    #[tracing::instrument(skip(self))]
    fn env_var(&self, key: &str) -> Result<String, env::VarError> {
        env::var(key)
    }

    #[tracing::instrument(skip(self))]
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
    }

    #[tracing::instrument(skip(self))]
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(skip(self))]
    fn config_dir(&self) -> Option<PathBuf> {
        dirs::config_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_to_string() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("installed.json");
        fs::write(&path, "{}").unwrap();

        let runtime = RealRuntime;
        assert!(runtime.exists(&path));
        assert_eq!(runtime.read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_read_missing_file_names_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.json");

        let runtime = RealRuntime;
        assert!(!runtime.exists(&path));
        let err = runtime.read_to_string(&path).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
