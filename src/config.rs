//! Configuration loading and management

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::input::{konami_code, KeyId};

/// Environment variable holding a comma-separated target sequence
pub const SEQUENCE_VAR: &str = "KONAMI_SEQUENCE";
/// Environment variable selecting the reset policy
pub const RESET_VAR: &str = "KONAMI_RESET";

/// Errors raised while building a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("target sequence must contain at least one key")]
    EmptySequence,

    #[error("unknown reset policy {0:?} (expected \"sticky\" or \"rearm\")")]
    UnknownPolicy(String),

    #[error("failed to read {var}: {source}")]
    Env {
        var: &'static str,
        #[source]
        source: std::env::VarError,
    },
}

/// Immutable, non-empty ordered list of keys to watch for
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TargetSequence(Vec<KeyId>);

impl TargetSequence {
    pub fn new(keys: Vec<KeyId>) -> Result<Self, ConfigError> {
        if keys.is_empty() {
            return Err(ConfigError::EmptySequence);
        }
        Ok(Self(keys))
    }

    /// Parse a comma-separated list of key names
    ///
    /// Whitespace around names is trimmed and empty entries are skipped.
    pub fn parse(list: &str) -> Result<Self, ConfigError> {
        let keys = list
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(KeyId::new)
            .collect();
        Self::new(keys)
    }

    pub fn keys(&self) -> &[KeyId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for TargetSequence {
    fn default() -> Self {
        Self(konami_code())
    }
}

impl<'de> Deserialize<'de> for TargetSequence {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keys = Vec::<KeyId>::deserialize(deserializer)?;
        Self::new(keys).map_err(serde::de::Error::custom)
    }
}

impl fmt::Display for TargetSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, key) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

/// What happens to the trigger after a successful match
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResetPolicy {
    /// Stay unlocked until teardown or an explicit reset
    #[default]
    Sticky,
    /// Re-arm right away; each further full match toggles the mode
    Rearm,
}

impl FromStr for ResetPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sticky" => Ok(Self::Sticky),
            "rearm" => Ok(Self::Rearm),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ResetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResetPolicy::Sticky => write!(f, "sticky"),
            ResetPolicy::Rearm => write!(f, "rearm"),
        }
    }
}

/// Trigger configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Keys that unlock the mode, in order
    pub sequence: TargetSequence,

    /// Behavior after a match
    pub reset: ResetPolicy,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_vars(read_var(SEQUENCE_VAR)?, read_var(RESET_VAR)?)
    }

    /// Build a configuration from optional raw values
    pub fn from_vars(sequence: Option<String>, reset: Option<String>) -> Result<Self, ConfigError> {
        let sequence = match sequence {
            Some(list) => TargetSequence::parse(&list)?,
            None => TargetSequence::default(),
        };
        let reset = match reset {
            Some(policy) => policy.parse()?,
            None => ResetPolicy::default(),
        };

        Ok(Self { sequence, reset })
    }
}

fn read_var(var: &'static str) -> Result<Option<String>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => Ok(Some(value)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(ConfigError::Env { var, source }),
    }
}
