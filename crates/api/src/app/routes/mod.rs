use axum::{
    Router,
    routing::{get, post, put},
};

pub mod blog;
pub mod system;
pub mod users;

/// Endpoints reachable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/users", post(users::signup))
        .route("/users/login", post(users::login))
        .route("/users/:id", get(users::get_user))
        .route("/blog-entries/:id", get(blog::get_entry))
}

/// Endpoints behind the auth middleware. Each handler evaluates its
/// operation's guard chain before touching any store.
pub fn protected_router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/users/:id", put(users::update_user).delete(users::delete_user))
        .route("/users/:id/role", put(users::change_role))
        .route("/blog-entries", post(blog::create_entry))
        .route(
            "/blog-entries/:id",
            put(blog::update_entry).delete(blog::delete_entry),
        )
}
