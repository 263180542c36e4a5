use escrow_types::{NormalizedWebhookEvent, compute_webhook_id};
use serde_json::Value;

use super::effect::map_effect;

/// Parse the raw webhook body and normalize every recoverable entry.
///
/// Accepts three shapes tolerantly: a top-level array, an object with an
/// `events` array, or a single object. Entries missing a transaction
/// signature, an unmapped type code, or a missing deal id are dropped
/// silently — they are not malformed JSON, just not actionable. Surviving
/// events are returned in input order with stable indices.
pub fn normalize(body: &[u8], webhook_id_header: Option<&str>) -> Result<Vec<NormalizedWebhookEvent>, String> {
    let value: Value = serde_json::from_slice(body).map_err(|e| e.to_string())?;

    let entries: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("events") {
            Some(Value::Array(items)) => items,
            _ => vec![Value::Object(map)],
        },
        other => vec![other],
    };

    let mut events = Vec::new();
    for (index, entry) in entries.into_iter().enumerate() {
        let Some(event) = normalize_entry(&entry, webhook_id_header, index as u64) else {
            continue;
        };
        events.push(event);
    }
    Ok(events)
}

fn normalize_entry(
    entry: &Value,
    webhook_id_header: Option<&str>,
    index: u64,
) -> Option<NormalizedWebhookEvent> {
    let sig = probe_str(entry, &["signature", "sig", "txSignature"])?;

    let deal_id = probe_str(entry, &["dealId", "deal_id", "escrowId", "account"])?;
    let type_code = probe_str(entry, &["type", "eventType", "kind"])?;
    let effect = map_effect(&type_code, deal_id)?;

    let when = probe_str(entry, &["timestamp", "blockTime"])
        .and_then(|s| s.parse::<i64>().ok())
        .or_else(|| probe_i64(entry, &["timestamp", "blockTime"]))
        .unwrap_or(0);
    let slot = probe_i64(entry, &["slot"]).unwrap_or(0).max(0) as u64;

    let id = compute_webhook_id(webhook_id_header, Some(&sig), Some(index));

    Some(NormalizedWebhookEvent::new(id, sig, slot, when, effect))
}

fn probe_str(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| {
        entry.get(key).and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    })
}

fn probe_i64(entry: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .find_map(|key| entry.get(key).and_then(Value::as_i64))
}
