//! Typed configuration, parsed once at process boot from environment
//! variables. Missing required environment is a fatal boot error, never a
//! runtime panic.

use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("environment variable {name} has an invalid value: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Which notification transport the worker runtime wires up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotifyDriver {
    Noop,
    Dialect,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub redis_url: String,
    pub webhook_secret: String,
    pub actions_baseurl: Option<String>,
    pub rpc_url: Option<String>,
    pub worker_concurrency: usize,
    pub log_level: String,
    pub auto_finalize_release: bool,
    pub auto_finalize_refund: bool,
    pub notify_driver: NotifyDriver,
    pub notify_dialect_key: Option<String>,
    pub notify_dialect_baseurl: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let redis_url = require("REDIS_URL")?;
        let webhook_secret = require("HELIUS_WEBHOOK_SECRET")?;

        let actions_baseurl = optional("ACTIONS_BASEURL");
        let rpc_url = optional("RPC_URL");

        let worker_concurrency = optional("WORKER_CONCURRENCY")
            .map(|raw| parse_concurrency(&raw))
            .transpose()?
            .unwrap_or(5)
            .max(1);

        let log_level = optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let auto_finalize_release = parse_bool(optional("AUTO_FINALIZE_RELEASE"));
        let auto_finalize_refund = parse_bool(optional("AUTO_FINALIZE_REFUND"));

        let notify_driver = match optional("NOTIFY_DRIVER").as_deref() {
            None | Some("noop") | Some("") => NotifyDriver::Noop,
            Some("dialect") => NotifyDriver::Dialect,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "NOTIFY_DRIVER",
                    reason: format!("unknown driver `{other}`, expected `noop` or `dialect`"),
                });
            }
        };

        let notify_dialect_key = optional("NOTIFY_DIALECT_KEY");
        let notify_dialect_baseurl = optional("NOTIFY_DIALECT_BASEURL");

        if notify_driver == NotifyDriver::Dialect {
            match &notify_dialect_baseurl {
                Some(url) if url.ends_with('/') => {}
                Some(_) => {
                    return Err(ConfigError::Invalid {
                        name: "NOTIFY_DIALECT_BASEURL",
                        reason: "must end with `/`".to_string(),
                    });
                }
                None => return Err(ConfigError::Missing("NOTIFY_DIALECT_BASEURL")),
            }
        }

        Ok(Self {
            redis_url,
            webhook_secret,
            actions_baseurl,
            rpc_url,
            worker_concurrency,
            log_level,
            auto_finalize_release,
            auto_finalize_refund,
            notify_driver,
            notify_dialect_key,
            notify_dialect_baseurl,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_concurrency(raw: &str) -> Result<usize, ConfigError> {
    raw.parse::<usize>().map_err(|_| ConfigError::Invalid {
        name: "WORKER_CONCURRENCY",
        reason: format!("`{raw}` is not a positive integer"),
    })
}

/// Accepts `true/1/yes/on`, case-insensitively; anything else is false.
fn parse_bool(raw: Option<String>) -> bool {
    matches!(
        raw.as_deref().map(str::to_lowercase).as_deref(),
        Some("true") | Some("1") | Some("yes") | Some("on")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_parsing_accepts_documented_truthy_values() {
        for v in ["true", "TRUE", "1", "yes", "YES", "on", "On"] {
            assert!(parse_bool(Some(v.to_string())), "expected {v} to be truthy");
        }
        for v in ["false", "0", "no", "off", ""] {
            assert!(!parse_bool(Some(v.to_string())), "expected {v} to be falsy");
        }
        assert!(!parse_bool(None));
    }

    #[test]
    fn concurrency_rejects_non_numeric_values() {
        assert!(parse_concurrency("not-a-number").is_err());
        assert!(parse_concurrency("8").is_ok());
    }
}
