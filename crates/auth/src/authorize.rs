//! Request authorization pipeline.
//!
//! ```text
//! START -> TOKEN_CHECKED -> PRINCIPAL_RESOLVED -> GUARDS_EVALUATED -> {ALLOWED, FORBIDDEN}
//! START -> UNAUTHENTICATED               (token missing/invalid/expired)
//! PRINCIPAL_RESOLVED -> UNAUTHENTICATED  (principal not found)
//! ```
//!
//! Authentication is a precondition, not a guard: if it fails no guard runs.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::chain::GuardChain;
use crate::error::AuthError;
use crate::guard::GuardContext;
use crate::principal::{Principal, PrincipalResolver};
use crate::store::UserStore;
use crate::token::TokenService;

/// Stage of one request's authorization, for tracing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AuthStage {
    Start,
    TokenChecked,
    PrincipalResolved,
    GuardsEvaluated,
    Allowed,
    Forbidden,
    Unauthenticated,
}

impl AuthStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthStage::Start => "start",
            AuthStage::TokenChecked => "token_checked",
            AuthStage::PrincipalResolved => "principal_resolved",
            AuthStage::GuardsEvaluated => "guards_evaluated",
            AuthStage::Allowed => "allowed",
            AuthStage::Forbidden => "forbidden",
            AuthStage::Unauthenticated => "unauthenticated",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AuthStage::Allowed | AuthStage::Forbidden | AuthStage::Unauthenticated
        )
    }
}

/// Token verification + principal resolution + guard evaluation.
///
/// Holds no per-request state; share it behind an `Arc`.
#[derive(Clone)]
pub struct Authorizer {
    tokens: Arc<TokenService>,
    resolver: PrincipalResolver,
}

impl Authorizer {
    pub fn new(tokens: Arc<TokenService>, users: Arc<dyn UserStore>) -> Self {
        Self {
            tokens,
            resolver: PrincipalResolver::new(users),
        }
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Verify the bearer token and resolve the principal.
    ///
    /// A missing token is `Malformed`. All errors here mean "unauthenticated".
    pub async fn authenticate(
        &self,
        token: Option<&str>,
        ctx: &GuardContext,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        trace_stage(AuthStage::Start);

        let result = self.authenticate_inner(token, ctx, now).await;
        if let Err(e) = &result {
            tracing::warn!(
                stage = AuthStage::Unauthenticated.as_str(),
                cause = %e,
                "request not authenticated"
            );
        }
        result
    }

    async fn authenticate_inner(
        &self,
        token: Option<&str>,
        ctx: &GuardContext,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        let token = token.ok_or(AuthError::Malformed)?;
        let subject = self.tokens.verify(token, now)?;
        trace_stage(AuthStage::TokenChecked);

        let principal = self.resolver.resolve(subject, ctx.lookup_timeout).await?;
        trace_stage(AuthStage::PrincipalResolved);
        Ok(principal)
    }

    /// Full pipeline for one protected operation.
    pub async fn authorize(
        &self,
        token: Option<&str>,
        chain: &GuardChain,
        ctx: &GuardContext,
        now: DateTime<Utc>,
    ) -> Result<Principal, AuthError> {
        let principal = self.authenticate(token, ctx, now).await?;
        check_guards(&principal, chain, ctx).await?;
        Ok(principal)
    }
}

/// Run an operation's guards for an authenticated principal, with logging.
pub async fn check_guards(
    principal: &Principal,
    chain: &GuardChain,
    ctx: &GuardContext,
) -> Result<(), AuthError> {
    let outcome = chain.evaluate(principal, ctx).await;
    trace_stage(AuthStage::GuardsEvaluated);

    match &outcome {
        Ok(()) => tracing::info!(
            stage = AuthStage::Allowed.as_str(),
            principal = %principal.id(),
            "request authorized"
        ),
        Err(e) => tracing::warn!(
            stage = AuthStage::Forbidden.as_str(),
            principal = %principal.id(),
            cause = %e,
            "request forbidden"
        ),
    }
    outcome
}

fn trace_stage(stage: AuthStage) {
    tracing::debug!(stage = stage.as_str(), "auth stage");
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use chrono::TimeZone;

    use quill_core::{ResourceId, UserId};

    use super::*;
    use crate::chain::tests::CountingGuard;
    use crate::guard::{DenyReason, OwnershipGuard, RoleGuard};
    use crate::memory::{InMemoryResourceStore, InMemoryUserStore};
    use crate::password::PasswordHash;
    use crate::roles::Role;
    use crate::store::UserRecord;

    const SECRET: &[u8] = b"authorizer-test-secret-32-bytes!!";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 4, 8, 0, 0).unwrap()
    }

    fn ctx() -> GuardContext {
        GuardContext::new(Duration::from_millis(200))
    }

    fn record(id: i64, role: Role) -> UserRecord {
        UserRecord {
            id: UserId::new(id),
            name: format!("user {id}"),
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            role,
            password_hash: PasswordHash::from_phc("$argon2id$placeholder"),
            profile_image: None,
        }
    }

    fn fixture() -> (Authorizer, Arc<InMemoryUserStore>) {
        let users = Arc::new(InMemoryUserStore::new());
        users.seed(record(42, Role::User)).unwrap();
        users.seed(record(1, Role::Admin)).unwrap();
        users.seed(record(7, Role::User)).unwrap();
        let tokens = Arc::new(TokenService::new(SECRET, Duration::from_secs(100)));
        (Authorizer::new(tokens, users.clone()), users)
    }

    #[tokio::test]
    async fn issued_token_resolves_to_principal() {
        let (authz, _) = fixture();
        let token = authz.tokens().issue(UserId::new(42), t0()).unwrap();

        let principal = authz.authenticate(Some(&token), &ctx(), t0()).await.unwrap();
        assert_eq!(principal.id(), UserId::new(42));
        assert_eq!(principal.role(), Role::User);
    }

    #[tokio::test]
    async fn deleted_subject_is_principal_not_found() {
        let (authz, users) = fixture();
        let token = authz.tokens().issue(UserId::new(42), t0()).unwrap();
        users.delete(UserId::new(42)).await.unwrap();

        let err = authz.authenticate(Some(&token), &ctx(), t0()).await.unwrap_err();
        assert_eq!(err, AuthError::PrincipalNotFound);
        assert!(err.is_unauthenticated());
    }

    #[tokio::test]
    async fn unauthenticated_requests_never_reach_guards() {
        let (authz, _) = fixture();
        let guard = CountingGuard::allowing();
        let calls = guard.calls.clone();
        let chain = GuardChain::new().with(guard);

        let missing = authz.authorize(None, &chain, &ctx(), t0()).await;
        assert_eq!(missing, Err(AuthError::Malformed));

        let token = authz.tokens().issue(UserId::new(42), t0()).unwrap();
        let expired = t0() + chrono::Duration::seconds(100);
        let late = authz.authorize(Some(&token), &chain, &ctx(), expired).await;
        assert_eq!(late, Err(AuthError::Expired));

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn admin_operation_by_user_is_forbidden_before_ownership_lookup() {
        let (authz, _) = fixture();
        let ownership = CountingGuard::allowing();
        let calls = ownership.calls.clone();
        let chain = GuardChain::new().with(RoleGuard::admin_only()).with(ownership);

        let token = authz.tokens().issue(UserId::new(42), t0()).unwrap();
        let err = authz
            .authorize(Some(&token), &chain, &ctx(), t0())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            AuthError::Forbidden {
                guard: "role",
                reason: DenyReason::RoleNotPermitted
            }
        );
        assert!(!err.is_unauthenticated());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let admin_token = authz.tokens().issue(UserId::new(1), t0()).unwrap();
        let admin = authz.authorize(Some(&admin_token), &chain, &ctx(), t0()).await;
        assert_eq!(admin.map(|p| p.id()), Ok(UserId::new(1)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn users_may_only_edit_their_own_resources() {
        let (authz, _) = fixture();
        let entries = Arc::new(InMemoryResourceStore::new());
        entries.set_owner(ResourceId::new(500), UserId::new(7)).unwrap();
        entries.set_owner(ResourceId::new(501), UserId::new(42)).unwrap();
        let chain = GuardChain::new().with(OwnershipGuard::via_store(entries));

        let token_a = authz.tokens().issue(UserId::new(42), t0()).unwrap();

        let others = ctx().with_resource(ResourceId::new(500));
        let denied = authz.authorize(Some(&token_a), &chain, &others, t0()).await;
        assert!(matches!(denied, Err(AuthError::Forbidden { .. })));

        let missing = ctx().with_resource(ResourceId::new(404));
        let not_found = authz.authorize(Some(&token_a), &chain, &missing, t0()).await;
        assert_eq!(
            denied.unwrap_err().rejection(),
            not_found.unwrap_err().rejection()
        );

        let own = ctx().with_resource(ResourceId::new(501));
        let allowed = authz.authorize(Some(&token_a), &chain, &own, t0()).await;
        assert_eq!(allowed.map(|p| p.id()), Ok(UserId::new(42)));
    }

    #[test]
    fn terminal_stages() {
        assert!(AuthStage::Allowed.is_terminal());
        assert!(AuthStage::Unauthenticated.is_terminal());
        assert!(!AuthStage::PrincipalResolved.is_terminal());
        assert_eq!(AuthStage::GuardsEvaluated.as_str(), "guards_evaluated");
    }
}
