//! Environment configuration for the sync engine and CRM clients.

use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::client::{Credentials, HUBSPOT_DEFAULT_API_URL, SALESFORCE_DEFAULT_API_VERSION};
use crate::sync::SyncPolicy;
use crate::util::is_http_url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunables shared by every sync run. Holds no secrets; access tokens are
/// supplied per run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub salesforce_api_version: String,
    pub hubspot_api_url: String,
    pub primary_fetch_limit: usize,
    pub write_batch_limit: usize,
    pub sample_size: usize,
    pub write_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let policy = SyncPolicy::default();
        Self {
            salesforce_api_version: SALESFORCE_DEFAULT_API_VERSION.to_string(),
            hubspot_api_url: HUBSPOT_DEFAULT_API_URL.to_string(),
            primary_fetch_limit: policy.primary_fetch_limit,
            write_batch_limit: policy.write_batch_limit,
            sample_size: policy.sample_size,
            write_interval: Duration::from_millis(200),
        }
    }
}

impl SyncConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let salesforce_api_version = value_or_default(
            &lookup,
            "SALESFORCE_API_VERSION",
            SALESFORCE_DEFAULT_API_VERSION,
        );
        if !salesforce_api_version.starts_with('v') {
            return Err(ConfigError::Invalid(
                "SALESFORCE_API_VERSION must look like v59.0".to_string(),
            ));
        }

        let hubspot_api_url = value_or_default(&lookup, "HUBSPOT_API_URL", HUBSPOT_DEFAULT_API_URL)
            .trim_end_matches('/')
            .to_string();
        if !is_http_url(&hubspot_api_url) {
            return Err(ConfigError::Invalid(
                "HUBSPOT_API_URL must start with http:// or https://".to_string(),
            ));
        }

        let primary_fetch_limit =
            parse_in_range(&lookup, "SYNC_PRIMARY_FETCH_LIMIT", 100_usize, 1..=2_000)?;
        let write_batch_limit =
            parse_in_range(&lookup, "SYNC_WRITE_BATCH_LIMIT", 10_usize, 1..=100)?;
        let sample_size = parse_in_range(&lookup, "SYNC_SAMPLE_SIZE", 5_usize, 1..=50)?;
        let write_interval_ms =
            parse_in_range(&lookup, "SYNC_WRITE_INTERVAL_MS", 200_u64, 0..=10_000)?;

        Ok(Self {
            salesforce_api_version,
            hubspot_api_url,
            primary_fetch_limit,
            write_batch_limit,
            sample_size,
            write_interval: Duration::from_millis(write_interval_ms),
        })
    }

    pub const fn policy(&self) -> SyncPolicy {
        SyncPolicy {
            primary_fetch_limit: self.primary_fetch_limit,
            write_batch_limit: self.write_batch_limit,
            sample_size: self.sample_size,
        }
    }
}

/// Caller credentials read from the environment.
///
/// A missing token leaves that side unset; the engine decides whether the run
/// can proceed without it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerCredentials {
    pub primary: Option<Credentials>,
    pub sink: Option<Credentials>,
}

impl CallerCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let primary = match optional_trimmed(&lookup, "SALESFORCE_ACCESS_TOKEN") {
            Some(token) => {
                let instance_url = required_trimmed(&lookup, "SALESFORCE_INSTANCE_URL")?;
                if !is_http_url(&instance_url) {
                    return Err(ConfigError::Invalid(
                        "SALESFORCE_INSTANCE_URL must start with http:// or https://".to_string(),
                    ));
                }
                Some(Credentials::new(token).with_instance_url(instance_url))
            }
            None => None,
        };

        let sink = optional_trimmed(&lookup, "HUBSPOT_ACCESS_TOKEN").map(Credentials::new);

        Ok(Self { primary, sink })
    }
}

fn parse_in_range<T>(
    lookup: impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
    range: RangeInclusive<T>,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Display,
{
    let invalid = || {
        ConfigError::Invalid(format!(
            "{name} must be an integer in [{}, {}]",
            range.start(),
            range.end()
        ))
    };

    let value = match optional_trimmed(&lookup, name) {
        Some(raw) => raw.parse::<T>().map_err(|_| invalid())?,
        None => default,
    };
    if !range.contains(&value) {
        return Err(invalid());
    }
    Ok(value)
}

fn value_or_default(lookup: impl Fn(&str) -> Option<String>, name: &str, default: &str) -> String {
    optional_trimmed(lookup, name).unwrap_or_else(|| default.to_string())
}

fn required_trimmed(
    lookup: impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    optional_trimmed(lookup, name).ok_or(ConfigError::MissingVar(name))
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name).and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
