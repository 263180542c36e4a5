use crate::ports::{ChainPolicy, FinalizeAction};

/// Strict-default [`ChainPolicy`]: both actions are disallowed unless
/// explicitly enabled. Constructed once at boot from configuration and
/// shared read-only across every processor call.
#[derive(Clone, Copy, Debug, Default)]
pub struct PolicyGate {
    allow_release: bool,
    allow_refund: bool,
}

impl PolicyGate {
    pub fn new(allow_release: bool, allow_refund: bool) -> Self {
        Self {
            allow_release,
            allow_refund,
        }
    }

    /// Both actions disallowed; the safe default for an unconfigured deployment.
    pub fn strict() -> Self {
        Self::default()
    }
}

impl ChainPolicy for PolicyGate {
    fn allows_auto_finalize(&self, action: FinalizeAction) -> bool {
        match action {
            FinalizeAction::Release => self.allow_release,
            FinalizeAction::Refund => self.allow_refund,
        }
    }
}
