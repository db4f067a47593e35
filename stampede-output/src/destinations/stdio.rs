//! Standard output destination

use serde::{Deserialize, Serialize};
use std::io::Write;

/// Standard streams for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StdStream {
    #[default]
    Stdout,
    Stderr,
}

/// Writes the table to one of the process's standard streams
#[derive(Debug, Clone, Default)]
pub struct StdioDestination {
    stream: StdStream,
}

impl StdioDestination {
    pub fn new(stream: StdStream) -> Self {
        Self { stream }
    }

    pub fn stream(&self) -> StdStream {
        self.stream
    }

    /// Open a handle on the stream. Both streams are line buffered or
    /// unbuffered by the standard library, so rows appear as they are written.
    pub fn open(&self) -> Box<dyn Write + Send> {
        match self.stream {
            StdStream::Stdout => Box::new(std::io::stdout()),
            StdStream::Stderr => Box::new(std::io::stderr()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stream() {
        assert_eq!(StdioDestination::default().stream(), StdStream::Stdout);
    }

    #[test]
    fn test_stream_names() {
        let stream: StdStream = serde_json::from_str("\"stderr\"").unwrap();
        assert_eq!(stream, StdStream::Stderr);
    }
}
