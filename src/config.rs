use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::info;

const ERROR_EVENT: &str = "EMITTER_ERROR_EVENT";
const FAULT_POLICY: &str = "EMITTER_FAULT_POLICY";
const LOG_LEVEL: &str = "EMITTER_LOG_LEVEL";
const SOURCE: &str = "EMITTER_SOURCE";

/// Errors raised while loading configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was present but could not be parsed
    #[error("invalid value {value:?} for environment variable {key}")]
    InvalidValue { key: &'static str, value: String },

    /// A variable was present but empty
    #[error("environment variable {0} must not be empty")]
    Empty(&'static str),
}

/// What a channel does when one of its listeners returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FaultPolicy {
    /// Keep dispatching to the remaining listeners and report every fault at the end.
    #[default]
    Collect,
    /// Stop at the first failing listener.
    FailFast,
}

impl FromStr for FaultPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "collect" => Ok(FaultPolicy::Collect),
            "fail-fast" | "fail_fast" | "failfast" => Ok(FaultPolicy::FailFast),
            other => Err(format!("unknown fault policy: {}", other)),
        }
    }
}

impl fmt::Display for FaultPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultPolicy::Collect => write!(f, "collect"),
            FaultPolicy::FailFast => write!(f, "fail-fast"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Event name routed to the unhandled-error path instead of a channel
    pub error_event: String,
    pub fault_policy: FaultPolicy,
    /// Max level for the binary's tracing subscriber
    pub log_level: String,
    /// Name attached to log lines emitted by a mediator
    pub source: String,
}

impl Config {
    /// Reads `.env` if present, then the process environment.
    pub fn try_from_env() -> Result<Config, ConfigError> {
        // Load .env file
        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults
    /// for anything the lookup does not know.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let error_event = match lookup(ERROR_EVENT) {
            Some(value) if value.trim().is_empty() => return Err(ConfigError::Empty(ERROR_EVENT)),
            Some(value) => value.trim().to_string(),
            None => defaults.error_event,
        };

        let fault_policy = match lookup(FAULT_POLICY) {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: FAULT_POLICY,
                value: value.clone(),
            })?,
            None => defaults.fault_policy,
        };

        let log_level = match lookup(LOG_LEVEL) {
            Some(value) => {
                let level = value.trim().to_ascii_lowercase();
                if level.parse::<tracing::Level>().is_err() {
                    return Err(ConfigError::InvalidValue { key: LOG_LEVEL, value });
                }
                level
            }
            None => defaults.log_level,
        };

        let source = lookup(SOURCE)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.source);

        info!(%error_event, %fault_policy, %log_level, %source, "Loaded emitter config");

        Ok(Config {
            error_event,
            fault_policy,
            log_level,
            source,
        })
    }

    /// Parsed form of `log_level`; falls back to INFO.
    pub fn tracing_level(&self) -> tracing::Level {
        self.log_level.parse().unwrap_or(tracing::Level::INFO)
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            error_event: "error".to_string(),
            fault_policy: FaultPolicy::Collect,
            log_level: "info".to_string(),
            source: "stream-emitter".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_set() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.error_event, "error");
        assert_eq!(config.fault_policy, FaultPolicy::Collect);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            (ERROR_EVENT, "failure"),
            (FAULT_POLICY, "fail-fast"),
            (LOG_LEVEL, "DEBUG"),
            (SOURCE, "bridge"),
        ])
        .unwrap();

        assert_eq!(config.error_event, "failure");
        assert_eq!(config.fault_policy, FaultPolicy::FailFast);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.tracing_level(), tracing::Level::DEBUG);
        assert_eq!(config.source, "bridge");
    }

    #[test]
    fn test_rejects_unknown_fault_policy() {
        let err = config_from(&[(FAULT_POLICY, "retry")]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidValue {
                key: FAULT_POLICY,
                value: "retry".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_bad_log_level_and_empty_error_event() {
        assert!(matches!(
            config_from(&[(LOG_LEVEL, "loud")]),
            Err(ConfigError::InvalidValue { key: LOG_LEVEL, .. })
        ));
        assert_eq!(
            config_from(&[(ERROR_EVENT, "  ")]),
            Err(ConfigError::Empty(ERROR_EVENT))
        );
    }

    #[test]
    fn test_fault_policy_round_trips_through_display() {
        for policy in [FaultPolicy::Collect, FaultPolicy::FailFast] {
            assert_eq!(policy.to_string().parse::<FaultPolicy>(), Ok(policy));
        }
    }
}
