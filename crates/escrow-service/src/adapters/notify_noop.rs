use std::collections::BTreeMap;

use async_trait::async_trait;
use escrow_core::{Notification, PortError, PrepareFinalizeResult, ReminderContext};
use escrow_types::{Audience, ReminderReason, Suggested};

use crate::logging::redact;

/// Flattens a `Serialize` context struct to the map shape `redact` scrubs.
/// Anything that doesn't serialize to a JSON object logs with an empty
/// context rather than panicking.
fn as_context<T: serde::Serialize>(value: &T) -> BTreeMap<String, serde_json::Value> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    }
}

/// Logs instead of sending. The default driver for deployments that don't
/// need a live notification transport, and for every test fake's sibling
/// in integration tests that exercise the HTTP surface end to end.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notification for NoopNotifier {
    async fn notify_reviewer(
        &self,
        deal_id: &str,
        suggested: Suggested,
        result: Option<&PrepareFinalizeResult>,
    ) -> Result<(), PortError> {
        let context = result.map(as_context).unwrap_or_default();
        tracing::info!(deal_id, %suggested, context = ?redact(&context), "notify_reviewer (noop)");
        Ok(())
    }

    async fn notify_parties(&self, deal_id: &str, event: &str) -> Result<(), PortError> {
        tracing::info!(deal_id, event, "notify_parties (noop)");
        Ok(())
    }

    async fn send_reminder(
        &self,
        deal_id: &str,
        when: i64,
        audience: Audience,
        reason: ReminderReason,
        context: ReminderContext,
    ) -> Result<(), PortError> {
        let redacted = redact(&as_context(&context));
        tracing::info!(deal_id, when, %audience, %reason, context = ?redacted, "send_reminder (noop)");
        Ok(())
    }
}
