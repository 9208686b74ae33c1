//! Operation → guard chain table for the HTTP surface.

use std::sync::Arc;

use axum::response::Response;

use quill_auth::{GuardChain, GuardContext, GuardTable, OwnershipGuard, Principal, RoleGuard};
use quill_core::ResourceId;

use crate::app::errors;
use crate::app::services::AppServices;
use crate::blog::BlogEntryStore;

/// Every protected operation the API exposes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operation {
    WhoAmI,
    UpdateUser,
    DeleteUser,
    ChangeUserRole,
    CreateBlogEntry,
    UpdateBlogEntry,
    DeleteBlogEntry,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Operation::WhoAmI,
        Operation::UpdateUser,
        Operation::DeleteUser,
        Operation::ChangeUserRole,
        Operation::CreateBlogEntry,
        Operation::UpdateBlogEntry,
        Operation::DeleteBlogEntry,
    ];
}

/// Build the table once at startup. Empty chains mean "authenticated only".
pub fn build_guard_table(entries: Arc<BlogEntryStore>) -> GuardTable<Operation> {
    let entry_owner = Arc::new(OwnershipGuard::via_store(entries));

    GuardTable::new()
        .register(Operation::WhoAmI, GuardChain::new())
        .register(Operation::UpdateUser, GuardChain::new().with(OwnershipGuard::self_only()))
        .register(Operation::DeleteUser, GuardChain::new().with(RoleGuard::admin_only()))
        .register(Operation::ChangeUserRole, GuardChain::new().with(RoleGuard::admin_only()))
        .register(Operation::CreateBlogEntry, GuardChain::new())
        .register(
            Operation::UpdateBlogEntry,
            GuardChain::new().with_shared(entry_owner.clone()),
        )
        .register(
            Operation::DeleteBlogEntry,
            GuardChain::new().with_shared(entry_owner),
        )
}

/// Run `operation`'s guards for the authenticated principal.
///
/// `resource` is the id parsed from the path, if any; an unparseable id is
/// passed as `None` so ownership guards deny it like any other missing resource.
pub async fn authorize_operation(
    services: &AppServices,
    operation: Operation,
    principal: &Principal,
    resource: Option<ResourceId>,
) -> Result<(), Response> {
    let mut ctx = GuardContext::new(services.lookup_timeout);
    if let Some(resource) = resource {
        ctx = ctx.with_resource(resource);
    }

    services
        .guards
        .evaluate(operation, principal, &ctx)
        .await
        .map_err(|e| errors::auth_error_to_response(&e))
}
