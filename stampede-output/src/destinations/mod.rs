//! Output destination implementations

pub mod filesystem;
pub mod stdio;

pub use filesystem::{FilesystemConfig, FilesystemDestination};
pub use stdio::{StdStream, StdioDestination};

use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::errors::OutputError;

/// Where the performance table is written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSink {
    Stdio { stream: StdStream },
    File(FilesystemConfig),
}

impl Default for OutputSink {
    fn default() -> Self {
        OutputSink::Stdio {
            stream: StdStream::Stdout,
        }
    }
}

impl OutputSink {
    pub fn stdout() -> Self {
        Self::default()
    }

    pub fn file(path: impl Into<std::path::PathBuf>) -> Self {
        OutputSink::File(FilesystemConfig::new(path))
    }

    /// Open the sink for writing
    pub fn open(&self) -> Result<Box<dyn Write + Send>, OutputError> {
        match self {
            OutputSink::Stdio { stream } => Ok(StdioDestination::new(*stream).open()),
            OutputSink::File(config) => FilesystemDestination::new(config.clone()).open_boxed(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            OutputSink::Stdio { stream } => format!("{:?}", stream).to_lowercase(),
            OutputSink::File(config) => config.path.display().to_string(),
        }
    }
}
