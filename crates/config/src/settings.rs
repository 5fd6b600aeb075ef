// Application settings
// Loaded from ~/.config/keybatch/settings.toml

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use keybatch_engine::dispatch::DEFAULT_CHUNK_SIZE;
use keybatch_engine::{AliasTable, FieldToken, Group, RetryPolicy, DEFAULT_OUTPUT_COLUMN};
use serde::{Deserialize, Serialize};

pub const ENV_API_BASE: &str = "KEYBATCH_API_BASE";
pub const ENV_API_TOKEN: &str = "KEYBATCH_API_TOKEN";

/// Excel's limit on sheet name length.
const MAX_SHEET_NAME_LEN: usize = 31;

#[derive(Debug)]
pub enum ConfigError {
    /// Settings file could not be read
    Io(String),
    /// Settings file is not valid TOML or has wrong types
    Parse(String),
    /// Settings parsed but a value is unusable
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "cannot read settings: {}", msg),
            ConfigError::Parse(msg) => write!(f, "invalid settings file: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid setting: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// `[batch]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Rows per remote call; clamped to 10..=1000 at dispatch
    pub chunk_size: usize,
    /// Column the keylog is written to
    pub output_column: String,
    /// Sheet name for xlsx export
    pub sheet_name: String,
    /// Sent as `version` on every request; service default when unset
    pub calculator_version: Option<String>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            output_column: DEFAULT_OUTPUT_COLUMN.to_string(),
            sheet_name: "Results".to_string(),
            calculator_version: None,
        }
    }
}

/// `[retry]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 4000,
        }
    }
}

/// `[aliases.<token>]` table: extra column names, tried after the built-in ones
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasOverride {
    pub primary: Vec<String>,
    pub secondary: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Service root, e.g. `http://localhost:5000/api/geometry`
    pub api_base: String,

    /// Bearer token, if the service wants one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    pub timeout_secs: u64,

    pub batch: BatchSettings,

    pub retry: RetrySettings,

    pub aliases: BTreeMap<String, AliasOverride>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:5000/api/geometry".to_string(),
            api_token: None,
            timeout_secs: 60,
            batch: BatchSettings::default(),
            retry: RetrySettings::default(),
            aliases: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keybatch")
            .join("settings.toml")
    }

    /// Load settings.
    ///
    /// An explicit path must exist. Without one, the default location is
    /// used if present and built-in defaults otherwise. Environment
    /// overrides are applied either way.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let path = Self::config_path();
                if path.exists() {
                    Self::from_file(&path)?
                } else {
                    log::debug!("no settings file at {}, using defaults", path.display());
                    Self::default()
                }
            }
        };
        let settings = settings.with_env_overrides(|key| std::env::var(key).ok());
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        log::debug!("loaded settings from {}", path.display());
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Apply `KEYBATCH_API_BASE` / `KEYBATCH_API_TOKEN`. Empty values are ignored.
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(base) = lookup(ENV_API_BASE).filter(|v| !v.is_empty()) {
            self.api_base = base;
        }
        if let Some(token) = lookup(ENV_API_TOKEN).filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::Invalid("api_base must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".into()));
        }
        if self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            return Err(ConfigError::Invalid(
                "retry.max_backoff_ms must not be below retry.initial_backoff_ms".into(),
            ));
        }
        if self.batch.output_column.trim().is_empty() {
            return Err(ConfigError::Invalid("batch.output_column must not be empty".into()));
        }
        let sheet_len = self.batch.sheet_name.chars().count();
        if sheet_len == 0 || sheet_len > MAX_SHEET_NAME_LEN {
            return Err(ConfigError::Invalid(format!(
                "batch.sheet_name must be 1-{} characters",
                MAX_SHEET_NAME_LEN
            )));
        }
        for token in self.aliases.keys() {
            token
                .parse::<FieldToken>()
                .map_err(|e| ConfigError::Invalid(format!("aliases: {}", e)))?;
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retry.max_attempts,
            initial_backoff: Duration::from_millis(self.retry.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.retry.max_backoff_ms),
        }
    }

    /// Built-in alias table extended with the `[aliases]` overrides.
    pub fn alias_table(&self) -> Result<AliasTable, ConfigError> {
        let mut table = AliasTable::with_builtin_aliases();
        for (name, extra) in &self.aliases {
            let token: FieldToken = name
                .parse()
                .map_err(|e| ConfigError::Invalid(format!("aliases: {}", e)))?;
            table.extend(token, Group::Primary, extra.primary.iter().cloned());
            table.extend(token, Group::Secondary, extra.secondary.iter().cloned());
        }
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.batch.chunk_size, 100);
        assert_eq!(settings.batch.output_column, "keylog");
        assert_eq!(settings.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let settings = Settings::from_toml(
            r#"
            api_base = "https://geo.example.com/api/geometry"

            [batch]
            chunk_size = 250
            calculator_version = "fx580"

            [retry]
            initial_backoff_ms = 0
            max_backoff_ms = 0
            "#,
        )
        .unwrap();
        assert_eq!(settings.api_base, "https://geo.example.com/api/geometry");
        assert_eq!(settings.timeout_secs, 60);
        assert_eq!(settings.batch.chunk_size, 250);
        assert_eq!(settings.batch.sheet_name, "Results");
        assert_eq!(settings.batch.calculator_version.as_deref(), Some("fx580"));
        assert_eq!(settings.retry.max_attempts, 3);
        assert_eq!(settings.retry_policy(), RetryPolicy::no_backoff());
        settings.validate().unwrap();
    }

    #[test]
    fn wrong_types_are_parse_errors() {
        let err = Settings::from_toml("timeout_secs = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "{err}");
    }

    #[test]
    fn alias_overrides_extend_builtin_lists() {
        let settings = Settings::from_toml(
            r#"
            [aliases.circle_radius]
            primary = ["R1", "radius"]
            secondary = ["R2"]
            "#,
        )
        .unwrap();
        settings.validate().unwrap();
        let table = settings.alias_table().unwrap();
        let primary = table.aliases(FieldToken::CircleRadius, Group::Primary);
        assert_eq!(primary.first().map(String::as_str), Some("circle_radius"));
        assert_eq!(primary.last().map(String::as_str), Some("radius"));
        assert!(table
            .aliases(FieldToken::CircleRadius, Group::Secondary)
            .contains(&"R2".to_string()));
    }

    #[test]
    fn unknown_alias_token_is_invalid() {
        let settings = Settings::from_toml("[aliases.cube_edge]\nprimary = [\"E\"]\n").unwrap();
        assert!(matches!(settings.validate(), Err(ConfigError::Invalid(_))));
        assert!(settings.alias_table().is_err());
    }

    #[test]
    fn env_overrides_replace_file_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_API_BASE, "http://10.0.0.5:5000/api/geometry"),
            (ENV_API_TOKEN, ""),
        ]);
        let settings = Settings::default()
            .with_env_overrides(|key| env.get(key).map(|v| v.to_string()));
        assert_eq!(settings.api_base, "http://10.0.0.5:5000/api/geometry");
        assert_eq!(settings.api_token, None, "empty token is ignored");
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut settings = Settings::default();
        settings.retry.max_attempts = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.batch.sheet_name = "a sheet name that is far too long".into();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn explicit_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn loads_explicit_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(&path, "timeout_secs = 5\n[batch]\noutput_column = \"result\"\n").unwrap();
        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.timeout(), Duration::from_secs(5));
        assert_eq!(settings.batch.output_column, "result");
    }
}
