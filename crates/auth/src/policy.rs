//! Operation → guard chain table, built once at startup.

use std::collections::HashMap;
use std::hash::Hash;

use crate::authorize::check_guards;
use crate::chain::GuardChain;
use crate::error::AuthError;
use crate::guard::{DenyReason, GuardContext};
use crate::principal::Principal;

/// Explicit registry of which guards protect which operation.
///
/// Operations that were never registered are denied.
#[derive(Debug, Clone)]
pub struct GuardTable<O> {
    chains: HashMap<O, GuardChain>,
}

impl<O> Default for GuardTable<O> {
    fn default() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }
}

impl<O> GuardTable<O>
where
    O: Copy + Eq + Hash + core::fmt::Debug,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, operation: O, chain: GuardChain) -> Self {
        if self.chains.insert(operation, chain).is_some() {
            tracing::warn!(?operation, "guard chain registered twice; keeping the last one");
        }
        self
    }

    pub fn chain(&self, operation: O) -> Option<&GuardChain> {
        self.chains.get(&operation)
    }

    pub async fn evaluate(
        &self,
        operation: O,
        principal: &Principal,
        ctx: &GuardContext,
    ) -> Result<(), AuthError> {
        let Some(chain) = self.chains.get(&operation) else {
            tracing::error!(?operation, "no guard chain registered for operation");
            return Err(AuthError::Forbidden {
                guard: "registry",
                reason: DenyReason::UnknownOperation,
            });
        };
        check_guards(principal, chain, ctx).await
    }
}
