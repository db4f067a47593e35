//! Domain-driven configuration management for Stampede
//!
//! This crate provides modular configuration split by functional domains,
//! with validation, defaults, and environment variable support. The values
//! it produces are immutable inputs to the coordinator and controllers.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;
pub use validation::Validatable;

// Re-export domain configurations
pub use domains::{
    coordinator::CoordinatorConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    magic::MagicConfig,
    manual::ManualConfig,
    output::OutputConfig,
    stress::{Breakpoint, StressConfig},
    target::TargetConfig,
    worker::WorkerConfig,
    StampedeConfig,
};

// Re-export utilities
pub use domains::utils::serde_duration;
