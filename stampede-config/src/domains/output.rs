//! Output table configuration

use serde::{Deserialize, Serialize};

use stampede_output::{OutputSink, Schema};

use crate::error::ConfigResult;
use crate::validation::Validatable;

/// Where the performance table goes and which columns it carries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    pub sink: OutputSink,

    /// Explicit column subset and order; the standard set when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<String>>,
}

impl OutputConfig {
    /// Column schema described by this configuration
    pub fn schema(&self) -> ConfigResult<Schema> {
        match &self.columns {
            Some(names) => {
                Schema::select(names.as_slice()).map_err(|e| self.validation_error(e.to_string()))
            }
            None => Ok(Schema::standard()),
        }
    }
}

impl Validatable for OutputConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let OutputSink::File(file) = &self.sink {
            if file.path.as_os_str().is_empty() {
                return Err(self.validation_error("sink file path cannot be empty"));
            }
        }

        self.schema().map(|_| ())
    }

    fn domain_name(&self) -> &'static str {
        "output"
    }
}
