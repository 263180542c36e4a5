use std::sync::Arc;

use escrow_core::{Api, QueueSubstrate, SchedulingEngine};
use escrow_types::SchedulingPlan;

/// Shared state for the HTTP surface. Generic over the queue substrate so
/// integration tests can swap in [`escrow_core::InMemoryQueue`] without a
/// live Redis instance.
pub struct AppState<Q: QueueSubstrate> {
    pub engine: Arc<SchedulingEngine<Q>>,
    pub api: Arc<dyn Api>,
    pub plan: SchedulingPlan,
    pub webhook_secret: String,
}

impl<Q: QueueSubstrate> Clone for AppState<Q> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            api: Arc::clone(&self.api),
            plan: self.plan.clone(),
            webhook_secret: self.webhook_secret.clone(),
        }
    }
}
