//! Axum extractors for authentication and role checks.
//!
//! # Usage
//!
//! ```rust,ignore
//! use hostel_allocation::auth::{AuthUser, RequireStaff};
//!
//! // Any authenticated caller.
//! async fn my_allocations(AuthUser(principal): AuthUser) -> ... { ... }
//!
//! // Wardens and admins only.
//! async fn allocate(staff: RequireStaff) -> ... { ... }
//! ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::request::Parts,
};

use super::verifier::TokenVerifier;
use crate::error::AllocationError;
use crate::server::state::AppState;
use crate::store::DocumentStore;
use crate::types::Principal;

/// Bearer token extracted from the `Authorization: Bearer <token>` header.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = AllocationError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                AllocationError::Unauthorized("missing authorization header".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AllocationError::Unauthorized(
                "invalid authorization format, expected 'Bearer <token>'".to_string(),
            )
        })?;

        if token.is_empty() {
            return Err(AllocationError::Unauthorized(
                "empty bearer token".to_string(),
            ));
        }

        Ok(Self(token.to_string()))
    }
}

/// Authenticated caller. Use as a handler parameter to require a valid token.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Principal);

#[async_trait]
impl<S: DocumentStore> FromRequestParts<AppState<S>> for AuthUser {
    type Rejection = AllocationError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let BearerToken(token) = BearerToken::from_request_parts(parts, state).await?;
        let principal = state.verifier.verify(&token).await?;
        Ok(Self(principal))
    }
}

/// Authenticated caller with warden or admin role.
#[derive(Debug, Clone, Copy)]
pub struct RequireStaff(pub Principal);

#[async_trait]
impl<S: DocumentStore> FromRequestParts<AppState<S>> for RequireStaff {
    type Rejection = AllocationError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_staff() {
            return Err(AllocationError::Forbidden(
                "warden or admin role required".to_string(),
            ));
        }
        Ok(Self(principal))
    }
}

/// Authenticated caller with admin role.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin(pub Principal);

#[async_trait]
impl<S: DocumentStore> FromRequestParts<AppState<S>> for RequireAdmin {
    type Rejection = AllocationError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(principal) = AuthUser::from_request_parts(parts, state).await?;
        if !principal.is_admin() {
            return Err(AllocationError::Forbidden(
                "admin role required".to_string(),
            ));
        }
        Ok(Self(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(header: Option<&str>) -> Result<BearerToken, AllocationError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = header {
            builder = builder.header("authorization", value);
        }
        let request = builder.body(()).unwrap();
        let (mut parts, ()) = request.into_parts();
        BearerToken::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn extracts_bearer_token() {
        let BearerToken(token) = extract(Some("Bearer abc123")).await.unwrap();
        assert_eq!(token, "abc123");
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let err = extract(None).await.unwrap_err();
        assert!(matches!(err, AllocationError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn wrong_scheme_is_unauthorized() {
        let err = extract(Some("Basic abc123")).await.unwrap_err();
        assert!(matches!(err, AllocationError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn empty_token_is_unauthorized() {
        let err = extract(Some("Bearer ")).await.unwrap_err();
        assert!(matches!(err, AllocationError::Unauthorized(_)));
    }
}
