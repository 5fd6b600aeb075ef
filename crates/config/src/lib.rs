// Configuration loading

pub mod settings;

pub use settings::{AliasOverride, BatchSettings, ConfigError, RetrySettings, Settings};
