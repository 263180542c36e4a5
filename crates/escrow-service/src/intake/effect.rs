use escrow_types::WebhookEffect;

/// Map a provider-specific type code onto the internal tagged effect set.
/// Unknown codes are dropped, not errors — a new provider event kind
/// should never fail a whole webhook batch.
pub fn map_effect(type_code: &str, deal_id: String) -> Option<WebhookEffect> {
    match type_code.to_uppercase().replace(['-', ' '], "_").as_str() {
        "DEAL_FUNDED" => Some(WebhookEffect::DealFunded { deal_id }),
        "DEAL_DELIVERED" => Some(WebhookEffect::DealDelivered { deal_id }),
        "DEAL_DISPUTED" => Some(WebhookEffect::DealDisputed { deal_id }),
        "DEAL_RELEASED" => Some(WebhookEffect::DealReleased { deal_id }),
        "DEAL_REFUNDED" => Some(WebhookEffect::DealRefunded { deal_id }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_known_codes_case_and_separator_insensitively() {
        for (raw, expect_delivered) in [
            ("deal_funded", false),
            ("DEAL-FUNDED", false),
            ("deal delivered", true),
        ] {
            let effect = map_effect(raw, "D-1".to_string());
            assert!(effect.is_some(), "expected {raw} to map");
            if expect_delivered {
                assert!(matches!(effect.unwrap(), WebhookEffect::DealDelivered { .. }));
            }
        }
    }

    #[test]
    fn unknown_code_is_dropped() {
        assert!(map_effect("something_else", "D-1".to_string()).is_none());
    }
}
