//! `quill-core` — shared primitives for the Quill workspace.
//!
//! This crate contains only identifiers and the domain error model (no IO).

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult, normalize_email};
pub use id::{EntryId, ResourceId, UserId};
