pub mod effect;
pub mod normalize;
pub mod signature;

use thiserror::Error;

pub use effect::map_effect;
pub use normalize::normalize;
pub use signature::verify_helius_signature;

use escrow_types::NormalizedWebhookEvent;

#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("malformed json: {0}")]
    MalformedJson(String),
    #[error("signature verification failed")]
    SignatureVerificationFailed,
}

/// Run the full intake pipeline: verify, parse, normalize, map effects,
/// construct events. Entries that fail any individual step are dropped
/// silently rather than aborting the whole batch (§4.5).
pub fn intake(
    secret: Option<&str>,
    signature_header: Option<&str>,
    webhook_id_header: Option<&str>,
    body: &[u8],
) -> Result<Vec<NormalizedWebhookEvent>, IntakeError> {
    if !verify_helius_signature(secret, signature_header, body) {
        return Err(IntakeError::SignatureVerificationFailed);
    }
    normalize::normalize(body, webhook_id_header).map_err(IntakeError::MalformedJson)
}
