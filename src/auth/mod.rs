//! Authentication and authorization.
//!
//! Requests carry a bearer token; a [`TokenVerifier`] resolves that token to
//! a [`crate::types::Principal`]. Handlers express their access requirements
//! through extractors ([`AuthUser`], [`RequireStaff`], [`RequireAdmin`])
//! rather than inline role checks.

pub mod middleware;
pub mod verifier;

pub use middleware::{AuthUser, BearerToken, RequireAdmin, RequireStaff};
pub use verifier::{StaticTokenVerifier, TokenVerifier};
