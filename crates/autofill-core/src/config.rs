//! Chief configuration.

use std::fmt;
use std::str::FromStr;

use evidence_source::DEFAULT_MAX_READ_BYTES;
use serde::{Deserialize, Serialize};

/// Deployment mode; decides which detective failures are intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    /// Every detective failure (error or panic) is logged and skipped.
    Production,
    /// Failures abort the run so bugs stay loud.
    #[default]
    Development,
    /// Same policy as development.
    Test,
}

impl RunMode {
    pub fn intercepts_failures(self) -> bool {
        matches!(self, RunMode::Production)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RunMode::Production => "production",
            RunMode::Development => "development",
            RunMode::Test => "test",
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(RunMode::Production),
            "development" | "dev" => Ok(RunMode::Development),
            "test" => Ok(RunMode::Test),
            other => Err(format!("unknown run mode: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChiefConfig {
    pub mode: RunMode,
    /// Per-key evidence read cap in bytes
    pub max_read_bytes: usize,
    /// Detectives run concurrently within one plan level; 1 is sequential
    pub fanout: usize,
}

impl Default for ChiefConfig {
    fn default() -> Self {
        ChiefConfig {
            mode: std::env::var("AUTOFILL_ENV")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            max_read_bytes: std::env::var("AUTOFILL_MAX_READ_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(DEFAULT_MAX_READ_BYTES),
            fanout: std::env::var("AUTOFILL_FANOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|&n| n > 0)
                .unwrap_or(1),
        }
    }
}

impl ChiefConfig {
    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    pub fn with_mode(mut self, mode: RunMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_max_read_bytes(mut self, bytes: usize) -> Self {
        self.max_read_bytes = bytes.max(1);
        self
    }

    pub fn with_fanout(mut self, fanout: usize) -> Self {
        self.fanout = fanout.max(1);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_mode_parse() {
        assert_eq!("Production".parse::<RunMode>().unwrap(), RunMode::Production);
        assert_eq!(" test ".parse::<RunMode>().unwrap(), RunMode::Test);
        assert!("staging".parse::<RunMode>().is_err());
    }

    #[test]
    fn test_only_production_intercepts() {
        assert!(RunMode::Production.intercepts_failures());
        assert!(!RunMode::Development.intercepts_failures());
        assert!(!RunMode::Test.intercepts_failures());
    }

    #[test]
    fn test_builders_clamp() {
        let config = ChiefConfig::default()
            .with_mode(RunMode::Test)
            .with_fanout(0)
            .with_max_read_bytes(0);
        assert_eq!(config.mode, RunMode::Test);
        assert_eq!(config.fanout, 1);
        assert_eq!(config.max_read_bytes, 1);
    }
}
