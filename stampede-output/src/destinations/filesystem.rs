//! Filesystem output destination

use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::errors::OutputError;

/// Configuration for the filesystem destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemConfig {
    pub path: PathBuf,
    /// Create parent directories (default: true)
    #[serde(default = "default_true")]
    pub create_dirs: bool,
    /// Replace an existing file (default: true)
    #[serde(default = "default_true")]
    pub overwrite: bool,
}

fn default_true() -> bool {
    true
}

impl FilesystemConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            create_dirs: true,
            overwrite: true,
        }
    }
}

/// Writes the table to a file
#[derive(Debug, Clone)]
pub struct FilesystemDestination {
    config: FilesystemConfig,
}

impl FilesystemDestination {
    pub fn new(config: FilesystemConfig) -> Self {
        Self { config }
    }

    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn fs_error(path: &Path, operation: &str, error: std::io::Error) -> OutputError {
        OutputError::Filesystem {
            path: path.to_string_lossy().to_string(),
            operation: operation.to_string(),
            error: error.to_string(),
        }
    }

    /// Create (or truncate) the file and return a buffered handle
    pub fn open(&self) -> Result<BufWriter<File>, OutputError> {
        let path = self.config.path.as_path();

        if path.as_os_str().is_empty() {
            return Err(OutputError::Filesystem {
                path: String::new(),
                operation: "validate".to_string(),
                error: "Output path is empty".to_string(),
            });
        }

        if path.exists() && !self.config.overwrite {
            return Err(OutputError::FileExists {
                path: path.to_string_lossy().to_string(),
            });
        }

        if self.config.create_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .map_err(|e| Self::fs_error(parent, "create_dirs", e))?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| Self::fs_error(path, "open", e))?;

        debug!("Writing output table to {}", path.display());
        Ok(BufWriter::new(file))
    }

    /// Boxed handle for use behind `dyn Write`
    pub fn open_boxed(&self) -> Result<Box<dyn Write + Send>, OutputError> {
        Ok(Box::new(self.open()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("runs").join("stress.csv");

        let destination = FilesystemDestination::new(FilesystemConfig::new(&path));
        {
            let mut writer = destination.open().unwrap();
            writer.write_all(b"ErrTotal\n0\n").unwrap();
            writer.flush().unwrap();
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "ErrTotal\n0\n");
    }

    #[test]
    fn test_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("table.csv");
        fs::write(&path, "previous").unwrap();

        let config = FilesystemConfig {
            overwrite: false,
            ..FilesystemConfig::new(&path)
        };
        let err = FilesystemDestination::new(config).open().unwrap_err();
        assert!(matches!(err, OutputError::FileExists { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous");
    }

    #[test]
    fn test_missing_parent_without_create_dirs() {
        let dir = TempDir::new().unwrap();
        let config = FilesystemConfig {
            create_dirs: false,
            ..FilesystemConfig::new(dir.path().join("missing").join("t.csv"))
        };
        let err = FilesystemDestination::new(config).open().unwrap_err();
        assert!(matches!(err, OutputError::Filesystem { ref operation, .. } if operation == "open"));
    }
}
