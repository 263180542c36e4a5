//! Structured JSON logging, one object per line, matching the
//! `{level, msg, ts, ...}` shape external consumers expect.

use std::collections::BTreeMap;

use tracing_subscriber::EnvFilter;

/// Initialize the global `tracing` subscriber. `log_level` seeds the
/// default filter when `RUST_LOG` is not set.
pub fn init(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Scrub any key containing `token` or `key` (case-insensitive) from a
/// logged context map before it reaches the subscriber.
pub fn redact(context: &BTreeMap<String, serde_json::Value>) -> BTreeMap<String, serde_json::Value> {
    context
        .iter()
        .map(|(k, v)| {
            let lower = k.to_lowercase();
            if lower.contains("token") || lower.contains("key") {
                (k.clone(), serde_json::Value::String("[redacted]".into()))
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect()
}
