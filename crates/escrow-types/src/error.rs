use thiserror;

/// Validation failures for the core data model.
///
/// These are raised by constructors, not by the processors: a processor
/// never sees an invalid [`crate::deal::DealSnapshot`] or
/// [`crate::webhook_event::NormalizedWebhookEvent`] because intake validates
/// at construction time and drops anything that fails.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("deal id must not be empty")]
    EmptyDealId,
    #[error("timestamp field `{field}` must be a positive integer, got {value}")]
    NonPositiveTimestamp { field: &'static str, value: i64 },
    #[error("webhook event is missing a transaction signature")]
    MissingSignature,
}
