//! Configuration loading from disk and the process environment.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", JoinErrors(.0))]
    Validation(Vec<ValidationError>),
}

struct JoinErrors<'a>(&'a [ValidationError]);

impl fmt::Display for JoinErrors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// An environment variable whose value could not be parsed and was ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredVar {
    pub name: &'static str,
    pub value: String,
}

/// Load configuration: defaults, then the optional TOML file, then the
/// environment. The result is validated before it is returned.
///
/// Logging is usually not installed yet, so ignored variables are handed
/// back for the caller to report.
pub fn load_config(path: Option<&Path>) -> Result<(ProxyConfig, Vec<IgnoredVar>), ConfigError> {
    let config = match path {
        Some(path) => load_file(path)?,
        None => ProxyConfig::default(),
    };

    let (config, ignored) = apply_env(config, |name| std::env::var(name).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok((config, ignored))
}

/// Parse a TOML file into a configuration without validating it.
pub fn load_file(path: &Path) -> Result<ProxyConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Overlay environment variables onto `config`.
///
/// Unset or empty variables leave the current value alone. Unparsable
/// values keep the current value and are reported back.
pub fn apply_env<F>(mut config: ProxyConfig, lookup: F) -> (ProxyConfig, Vec<IgnoredVar>)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.is_empty());
    let mut ignored = Vec::new();

    if let Some(v) = get("TIMEOUT") {
        parse_into("TIMEOUT", v, &mut config.timeouts.request_secs, &mut ignored);
    }
    if let Some(v) = get("RETRIES") {
        parse_into("RETRIES", v, &mut config.retries.max_attempts, &mut ignored);
    }
    if let Some(v) = get("BACKOFF_MS") {
        parse_into("BACKOFF_MS", v, &mut config.retries.base_delay_ms, &mut ignored);
    }
    if let Some(v) = get("PORT") {
        parse_into("PORT", v, &mut config.listener.port, &mut ignored);
    }
    if let Some(v) = get("LOG_FORMAT") {
        parse_into("LOG_FORMAT", v, &mut config.observability.log_format, &mut ignored);
    }
    // A set-but-empty KEY leaves the gate off; it does not admit only
    // callers that send an empty header.
    if let Some(v) = get("KEY") {
        config.admission.secret = Some(v);
    }
    if let Some(v) = get("PROXYKEY_HEADER") {
        config.admission.header = v;
    }
    if let Some(v) = get("UPSTREAM_DOMAIN") {
        config.upstream.domain = v;
    }

    (config, ignored)
}

fn parse_into<T: FromStr>(
    name: &'static str,
    raw: String,
    slot: &mut T,
    ignored: &mut Vec<IgnoredVar>,
) {
    match raw.trim().parse() {
        Ok(value) => *slot = value,
        Err(_) => ignored.push(IgnoredVar { name, value: raw }),
    }
}
