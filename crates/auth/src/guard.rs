//! Access guards: predicates over `(principal, resource reference)`.
//!
//! Guards never mutate anything. A guard that cannot decide (store down,
//! timeout) returns an error, and the chain treats that as a denial.

use std::collections::HashSet;
use std::time::Duration;

use quill_core::{ResourceId, UserId};

use crate::error::{AuthError, StoreError};
use crate::principal::Principal;
use crate::roles::Role;
use crate::store::{ResourceStore, bounded};

/// Per-request inputs for guard evaluation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct GuardContext {
    /// Resource named by the request (e.g. the `{id}` path parameter).
    pub resource: Option<ResourceId>,
    /// Budget for each store lookup a guard performs.
    pub lookup_timeout: Duration,
}

impl GuardContext {
    pub fn new(lookup_timeout: Duration) -> Self {
        Self {
            resource: None,
            lookup_timeout,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<ResourceId>) -> Self {
        self.resource = Some(resource.into());
        self
    }
}

/// Why a guard denied. Logged, never shown to the caller.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DenyReason {
    RoleNotPermitted,
    NotOwner,
    ResourceNotFound,
    /// The request did not name a resource.
    MissingResource,
    /// A lookup needed to decide failed or timed out.
    StoreUnavailable,
    /// The operation has no registered guard chain.
    UnknownOperation,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Deny(DenyReason),
}

impl GuardDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GuardDecision::Allow)
    }
}

#[async_trait::async_trait]
pub trait Guard: Send + Sync {
    /// Stable name used in logs and in `AuthError::Forbidden`.
    fn name(&self) -> &'static str;

    async fn check(&self, principal: &Principal, ctx: &GuardContext) -> Result<GuardDecision, AuthError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Role guard
// ─────────────────────────────────────────────────────────────────────────────

/// Pure role-membership check. No IO.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleGuard {
    allowed: HashSet<Role>,
}

impl RoleGuard {
    pub fn new(allowed: impl IntoIterator<Item = Role>) -> Self {
        Self {
            allowed: allowed.into_iter().collect(),
        }
    }

    pub fn admin_only() -> Self {
        Self::new([Role::Admin])
    }

    /// `true` iff the principal's role is in the allowed set. An empty set
    /// allows nobody.
    pub fn allows(&self, principal: &Principal) -> bool {
        self.allowed.contains(&principal.role())
    }
}

#[async_trait::async_trait]
impl Guard for RoleGuard {
    fn name(&self) -> &'static str {
        "role"
    }

    async fn check(&self, principal: &Principal, _ctx: &GuardContext) -> Result<GuardDecision, AuthError> {
        if self.allows(principal) {
            Ok(GuardDecision::Allow)
        } else {
            Ok(GuardDecision::Deny(DenyReason::RoleNotPermitted))
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Ownership guard
// ─────────────────────────────────────────────────────────────────────────────

/// Strategy for finding who owns a resource.
#[async_trait::async_trait]
pub trait OwnerResolver: Send + Sync {
    /// `None` when the resource does not exist.
    async fn owner_of(&self, resource: ResourceId) -> Result<Option<UserId>, StoreError>;
}

/// The resource *is* a user account: its owner is itself. No lookup.
#[derive(Debug, Copy, Clone, Default)]
pub struct SelfOwnership;

#[async_trait::async_trait]
impl OwnerResolver for SelfOwnership {
    async fn owner_of(&self, resource: ResourceId) -> Result<Option<UserId>, StoreError> {
        Ok(Some(UserId::from(resource)))
    }
}

/// Ownership looked up in a [`ResourceStore`].
#[derive(Debug, Clone)]
pub struct StoreOwnership<S> {
    store: S,
}

impl<S> StoreOwnership<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S: ResourceStore> OwnerResolver for StoreOwnership<S> {
    async fn owner_of(&self, resource: ResourceId) -> Result<Option<UserId>, StoreError> {
        self.store.find_owner_of(resource).await
    }
}

/// Allows the principal only on resources it owns.
///
/// "Does not exist" and "owned by someone else" are both plain denials.
#[derive(Debug, Clone)]
pub struct OwnershipGuard<R> {
    resolver: R,
}

impl OwnershipGuard<SelfOwnership> {
    pub fn self_only() -> Self {
        Self::new(SelfOwnership)
    }
}

impl<S: ResourceStore> OwnershipGuard<StoreOwnership<S>> {
    pub fn via_store(store: S) -> Self {
        Self::new(StoreOwnership::new(store))
    }
}

impl<R: OwnerResolver> OwnershipGuard<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// `Ok(true)` iff the resource exists and is owned by the principal.
    pub async fn allows(
        &self,
        principal: &Principal,
        resource: ResourceId,
        budget: Duration,
    ) -> Result<bool, AuthError> {
        let owner = bounded(budget, self.resolver.owner_of(resource))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;
        Ok(owner == Some(principal.id()))
    }
}

#[async_trait::async_trait]
impl<R: OwnerResolver> Guard for OwnershipGuard<R> {
    fn name(&self) -> &'static str {
        "ownership"
    }

    async fn check(&self, principal: &Principal, ctx: &GuardContext) -> Result<GuardDecision, AuthError> {
        let Some(resource) = ctx.resource else {
            return Ok(GuardDecision::Deny(DenyReason::MissingResource));
        };

        let owner = bounded(ctx.lookup_timeout, self.resolver.owner_of(resource))
            .await
            .map_err(|e| AuthError::StoreUnavailable(e.to_string()))?;

        Ok(match owner {
            None => GuardDecision::Deny(DenyReason::ResourceNotFound),
            Some(owner) if owner == principal.id() => GuardDecision::Allow,
            Some(_) => GuardDecision::Deny(DenyReason::NotOwner),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::InMemoryResourceStore;

    const BUDGET: Duration = Duration::from_millis(200);

    fn user(id: i64) -> Principal {
        Principal::new(UserId::new(id), Role::User)
    }

    fn admin(id: i64) -> Principal {
        Principal::new(UserId::new(id), Role::Admin)
    }

    #[test]
    fn role_guard_is_set_membership_for_every_combination() {
        let subsets: [&[Role]; 4] = [&[], &[Role::User], &[Role::Admin], &[Role::User, Role::Admin]];
        for required in subsets {
            let guard = RoleGuard::new(required.iter().copied());
            for role in Role::ALL {
                let principal = Principal::new(UserId::new(1), role);
                assert_eq!(
                    guard.allows(&principal),
                    required.contains(&role),
                    "role {role} against {required:?}"
                );
            }
        }
    }

    #[test]
    fn empty_set_denies_and_full_set_allows() {
        let none = RoleGuard::new(Vec::<Role>::new());
        let all = RoleGuard::new(Role::ALL);
        for role in Role::ALL {
            let principal = Principal::new(UserId::new(1), role);
            assert!(!none.allows(&principal));
            assert!(all.allows(&principal));
        }
    }

    #[tokio::test]
    async fn role_guard_reports_reason() {
        let ctx = GuardContext::new(BUDGET);
        let guard = RoleGuard::admin_only();
        assert_eq!(guard.check(&admin(1), &ctx).await, Ok(GuardDecision::Allow));
        assert_eq!(
            guard.check(&user(1), &ctx).await,
            Ok(GuardDecision::Deny(DenyReason::RoleNotPermitted))
        );
    }

    #[tokio::test]
    async fn self_ownership_compares_ids_directly() {
        let guard = OwnershipGuard::self_only();
        let ctx = GuardContext::new(BUDGET).with_resource(UserId::new(7));

        assert_eq!(guard.check(&user(7), &ctx).await, Ok(GuardDecision::Allow));
        assert_eq!(
            guard.check(&user(8), &ctx).await,
            Ok(GuardDecision::Deny(DenyReason::NotOwner))
        );
        // Admins get no implicit ownership.
        assert!(!guard.check(&admin(8), &ctx).await.unwrap().is_allowed());
    }

    #[tokio::test]
    async fn store_ownership_allows_only_the_owner() {
        let store = Arc::new(InMemoryResourceStore::new());
        store.set_owner(ResourceId::new(100), UserId::new(1)).unwrap();
        let guard = OwnershipGuard::via_store(store);

        let owned = ResourceId::new(100);
        let missing = ResourceId::new(999);

        assert_eq!(guard.allows(&user(1), owned, BUDGET).await, Ok(true));
        assert_eq!(guard.allows(&user(2), owned, BUDGET).await, Ok(false));
        assert_eq!(guard.allows(&user(1), missing, BUDGET).await, Ok(false));

        let ctx = GuardContext::new(BUDGET).with_resource(missing);
        assert_eq!(
            guard.check(&user(1), &ctx).await,
            Ok(GuardDecision::Deny(DenyReason::ResourceNotFound))
        );
    }

    #[tokio::test]
    async fn missing_resource_reference_is_denied() {
        let guard = OwnershipGuard::self_only();
        let ctx = GuardContext::new(BUDGET);
        assert_eq!(
            guard.check(&user(1), &ctx).await,
            Ok(GuardDecision::Deny(DenyReason::MissingResource))
        );
    }

    struct StalledStore;

    #[async_trait::async_trait]
    impl ResourceStore for StalledStore {
        async fn find_owner_of(&self, _resource: ResourceId) -> Result<Option<UserId>, StoreError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Some(UserId::new(1)))
        }
    }

    #[tokio::test]
    async fn lookup_timeout_is_an_error_not_an_allow() {
        let guard = OwnershipGuard::via_store(StalledStore);
        let ctx = GuardContext::new(Duration::from_millis(20)).with_resource(ResourceId::new(1));

        let result = guard.check(&user(1), &ctx).await;
        assert!(matches!(result, Err(AuthError::StoreUnavailable(_))));
    }
}
