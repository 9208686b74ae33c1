//! HTTP API: server, routing, and request/response mapping.

pub mod app;
pub mod authz;
pub mod blog;
pub mod context;
pub mod middleware;
