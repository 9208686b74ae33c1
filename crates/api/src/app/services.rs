use std::sync::Arc;
use std::time::Duration;

use quill_auth::{
    AuthConfig, Authorizer, ConfigError, CredentialService, GuardTable, InMemoryUserStore,
    PasswordHasher, TokenService, UserStore,
};

use crate::authz::{self, Operation};
use crate::blog::BlogEntryStore;

/// Everything the handlers need, built once and shared behind an `Arc`.
pub struct AppServices {
    pub users: Arc<dyn UserStore>,
    pub entries: Arc<BlogEntryStore>,
    pub credentials: CredentialService,
    pub authorizer: Arc<Authorizer>,
    pub guards: GuardTable<Operation>,
    pub lookup_timeout: Duration,
}

impl AppServices {
    /// Wire the services over caller-provided stores.
    pub fn new(
        config: &AuthConfig,
        users: Arc<dyn UserStore>,
        entries: Arc<BlogEntryStore>,
    ) -> Result<Self, ConfigError> {
        let hasher = Arc::new(PasswordHasher::new(config.hash_cost)?);
        let tokens = Arc::new(TokenService::from_config(config));

        let credentials = CredentialService::new(
            users.clone(),
            hasher,
            tokens.clone(),
            config.store_timeout,
        );
        let authorizer = Arc::new(Authorizer::new(tokens, users.clone()));
        let guards = authz::build_guard_table(entries.clone());

        Ok(Self {
            users,
            entries,
            credentials,
            authorizer,
            guards,
            lookup_timeout: config.store_timeout,
        })
    }
}

/// In-memory wiring used by the binary and the black-box tests.
pub fn build_services(config: &AuthConfig) -> Result<AppServices, ConfigError> {
    tracing::info!(config = ?config, "wiring in-memory stores");
    AppServices::new(
        config,
        Arc::new(InMemoryUserStore::new()),
        Arc::new(BlogEntryStore::new()),
    )
}
