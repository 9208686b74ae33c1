//! Ordered guard composition with short-circuit evaluation.

use std::sync::Arc;

use crate::error::AuthError;
use crate::guard::{DenyReason, Guard, GuardContext, GuardDecision};
use crate::principal::Principal;

/// Guards for one protected operation, evaluated in declaration order.
///
/// Evaluation stops at the first guard that denies or errors; later guards
/// (and their store lookups) never run. An empty chain allows any
/// authenticated principal.
#[derive(Clone, Default)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl core::fmt::Debug for GuardChain {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list()
            .entries(self.guards.iter().map(|g| g.name()))
            .finish()
    }
}

impl GuardChain {
    /// Chain with no guards (authentication only).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, guard: impl Guard + 'static) -> Self {
        self.guards.push(Arc::new(guard));
        self
    }

    pub fn with_shared(mut self, guard: Arc<dyn Guard>) -> Self {
        self.guards.push(guard);
        self
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Run the guards against an already authenticated principal.
    ///
    /// # Errors
    ///
    /// `AuthError::Forbidden` naming the first failing guard. A guard error
    /// is reported as `DenyReason::StoreUnavailable` (fail closed).
    pub async fn evaluate(&self, principal: &Principal, ctx: &GuardContext) -> Result<(), AuthError> {
        for guard in &self.guards {
            let reason = match guard.check(principal, ctx).await {
                Ok(GuardDecision::Allow) => continue,
                Ok(GuardDecision::Deny(reason)) => reason,
                Err(e) => {
                    tracing::warn!(guard = guard.name(), error = %e, "guard could not decide; denying");
                    DenyReason::StoreUnavailable
                }
            };

            return Err(AuthError::Forbidden {
                guard: guard.name(),
                reason,
            });
        }
        Ok(())
    }
}
